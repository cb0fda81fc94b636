use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pharmacy_shared::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // Subject (user ID)
    pub role: UserRole,     // customer or staff
    pub exp: i64,           // Expiration time
    pub iat: i64,           // Issued at
    pub jti: String,        // JWT ID
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))
    }

    pub fn is_access(&self) -> bool {
        self.token_type == ACCESS_TOKEN_TYPE
    }
}

/// Verifies HS256 bearer tokens. Tokens are minted elsewhere; signing here
/// exists for tooling and tests.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        // Validate secret strength
        if secret.len() < 32 {
            return Err(AppError::Internal(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30; // 30 seconds leeway for clock skew

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Authentication("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::Authentication("Invalid token signature".to_string())
                }
                _ => AppError::Authentication(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Sign an access token for the given subject
    pub fn generate_access_token(&self, user_id: Uuid, role: UserRole, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn short_secrets_are_rejected() {
        assert!(JwtService::new("short").is_err());
    }

    #[test]
    fn issued_tokens_validate() {
        let service = JwtService::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();
        let token = service
            .generate_access_token(user_id, UserRole::Staff, Duration::minutes(15))
            .unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role, UserRole::Staff);
        assert!(claims.is_access());
    }

    #[test]
    fn expired_and_foreign_tokens_fail() {
        let service = JwtService::new(SECRET).unwrap();
        let expired = service
            .generate_access_token(Uuid::new_v4(), UserRole::Customer, Duration::hours(-2))
            .unwrap();
        assert!(matches!(
            service.validate_token(&expired),
            Err(AppError::Authentication(_))
        ));

        let other = JwtService::new("another-secret-that-is-long-enough-too").unwrap();
        let token = other
            .generate_access_token(Uuid::new_v4(), UserRole::Customer, Duration::minutes(5))
            .unwrap();
        assert!(service.validate_token(&token).is_err());
    }
}
