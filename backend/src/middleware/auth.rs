use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::jwt::{Claims, JwtService};
use pharmacy_shared::UserRole;

/// Who is making a storefront request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Signed-in customer or staff member
    Member(Uuid),
    /// Anonymous visitor, identified only by the session cookie
    Guest,
}

impl Actor {
    pub fn is_guest(&self) -> bool {
        matches!(self, Actor::Guest)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::Member(user_id) => Some(*user_id),
            Actor::Guest => None,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn access_claims(jwt_service: &JwtService, token: &str) -> Result<Claims, AppError> {
    let claims = jwt_service.validate_token(token)?;
    if !claims.is_access() {
        return Err(AppError::Authentication("Access token required".to_string()));
    }
    Ok(claims)
}

/// Resolve the actor from an optional bearer token.
/// No token means guest; a token that fails validation is rejected.
pub fn resolve_actor(req: &HttpRequest) -> Result<Actor, AppError> {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return Ok(Actor::Member(claims.user_id()?));
    }

    let token = match bearer_token(req) {
        Some(token) => token,
        None => return Ok(Actor::Guest),
    };

    let jwt_service = req
        .app_data::<web::Data<JwtService>>()
        .ok_or_else(|| AppError::Internal("JWT service not configured".to_string()))?;

    let claims = access_claims(jwt_service, token)?;
    Ok(Actor::Member(claims.user_id()?))
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_actor(req))
    }
}

/// Staff member behind an admin request, taken from claims the middleware stored
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl FromRequest for StaffUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Authentication("Authorization token is required".to_string()))
            .and_then(|claims| {
                if claims.role != UserRole::Staff {
                    return Err(AppError::Forbidden("Staff access required".to_string()));
                }
                Ok(StaffUser {
                    user_id: claims.user_id()?,
                    role: claims.role,
                })
            });

        ready(result)
    }
}

pub fn has_required_role(role: &UserRole, required_role: UserRole) -> bool {
    match required_role {
        UserRole::Customer => true,
        UserRole::Staff => *role == UserRole::Staff,
    }
}

/// Requires a valid access token, optionally with a minimum role
pub struct AuthMiddleware {
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            jwt_service: Rc::new(jwt_service),
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: UserRole) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: Rc<JwtService>,
    required_role: Option<UserRole>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_service = self.jwt_service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string);

            let token = match token {
                Some(token) => token,
                None => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "missing_token",
                        "message": "Authorization token is required"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let claims = match access_claims(&jwt_service, &token) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::debug!("Rejected bearer token: {}", e);
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "error": "invalid_token",
                        "message": e.to_string()
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            if let Some(required_role) = required_role {
                if !has_required_role(&claims.role, required_role) {
                    let response = HttpResponse::Forbidden().json(serde_json::json!({
                        "error": "insufficient_permissions",
                        "message": "Insufficient permissions for this operation"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            req.extensions_mut().insert(claims);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse};
    use chrono::Duration;

    const SECRET: &str = "middleware-test-secret-0123456789abcdef";

    async fn whoami(actor: Actor) -> HttpResponse {
        match actor {
            Actor::Member(id) => HttpResponse::Ok().body(id.to_string()),
            Actor::Guest => HttpResponse::Ok().body("guest"),
        }
    }

    async fn staff_only(staff: StaffUser) -> HttpResponse {
        HttpResponse::Ok().body(staff.user_id.to_string())
    }

    #[actix_web::test]
    async fn actor_defaults_to_guest_without_token() {
        let jwt = JwtService::new(SECRET).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "guest");
    }

    #[actix_web::test]
    async fn actor_is_member_with_valid_token() {
        let jwt = JwtService::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();
        let token = jwt
            .generate_access_token(user_id, UserRole::Customer, Duration::minutes(5))
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(test::read_body(resp).await, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn bad_token_is_rejected() {
        let jwt = JwtService::new(SECRET).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn admin_scope_requires_staff_role() {
        let jwt = JwtService::new(SECRET).unwrap();
        let customer = jwt
            .generate_access_token(Uuid::new_v4(), UserRole::Customer, Duration::minutes(5))
            .unwrap();
        let staff = jwt
            .generate_access_token(Uuid::new_v4(), UserRole::Staff, Duration::minutes(5))
            .unwrap();

        let app = test::init_service(
            App::new().service(
                web::scope("/admin")
                    .wrap(AuthMiddleware::new(jwt.clone()).require_role(UserRole::Staff))
                    .route("/ping", web::get().to(staff_only)),
            ),
        )
        .await;

        let anonymous = test::call_service(&app, test::TestRequest::get().uri("/admin/ping").to_request()).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", customer)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/admin/ping")
            .insert_header(("Authorization", format!("Bearer {}", staff)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
