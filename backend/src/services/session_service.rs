use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::{DateTime, Utc};
use pharmacy_shared::{FlashMessage, SESSION_COOKIE_NAME};
use sqlx::{PgConnection, PgPool};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::session::{GuestCartLine, SessionData, SessionRecord};
use std::collections::BTreeMap;

/// A browser session loaded for the duration of one request
#[derive(Debug, Clone)]
pub struct Session {
    key: Uuid,
    data: SessionData,
    is_new: bool,
    modified: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            key: Uuid::new_v4(),
            data: SessionData::default(),
            is_new: true,
            modified: false,
        }
    }

    fn existing(key: Uuid, data: SessionData) -> Self {
        Self {
            key,
            data,
            is_new: false,
            modified: false,
        }
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Replace the contents with a fresher copy read from storage
    pub fn reload(&mut self, data: SessionData) {
        self.data = data;
    }

    pub fn cart(&self) -> &BTreeMap<String, GuestCartLine> {
        &self.data.cart
    }

    pub fn cart_mut(&mut self) -> &mut BTreeMap<String, GuestCartLine> {
        self.modified = true;
        &mut self.data.cart
    }

    /// Queue a message for the next page the visitor sees
    pub fn flash(&mut self, message: FlashMessage) {
        self.modified = true;
        self.data.messages.push(message);
    }

    pub fn take_messages(&mut self) -> Vec<FlashMessage> {
        if self.data.messages.is_empty() {
            return Vec::new();
        }
        self.modified = true;
        std::mem::take(&mut self.data.messages)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and stores server-side sessions keyed by the `sessionid` cookie
#[derive(Clone)]
pub struct SessionService {
    db_pool: PgPool,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionService {
    pub fn new(db_pool: PgPool, ttl: Duration, secure_cookies: bool) -> Self {
        Self {
            db_pool,
            ttl,
            secure_cookies,
        }
    }

    /// Session for this request; unknown, malformed or expired cookies start a fresh one
    pub async fn load(&self, req: &HttpRequest) -> Result<Session, AppError> {
        let key = req
            .cookie(SESSION_COOKIE_NAME)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

        let key = match key {
            Some(key) => key,
            None => return Ok(Session::new()),
        };

        match SessionRecord::find_live(&self.db_pool, key).await? {
            Some(record) => Ok(Session::existing(record.session_key, record.data.0)),
            None => {
                debug!("Session {} not found or expired, starting a new one", key);
                Ok(Session::new())
            }
        }
    }

    fn expires_at(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::days(14));
        Utc::now() + ttl
    }

    /// Persist the session if anything changed
    pub async fn save(&self, session: &Session) -> Result<(), AppError> {
        if !session.is_modified() {
            return Ok(());
        }
        SessionRecord::upsert(&self.db_pool, session.key, &session.data, self.expires_at()).await
    }

    /// Persist the session inside a caller-owned transaction
    pub async fn save_in(&self, conn: &mut PgConnection, session: &Session) -> Result<(), AppError> {
        SessionRecord::upsert(conn, session.key, &session.data, self.expires_at()).await
    }

    /// Cookie to send back when the session is new or was written
    pub fn cookie_for(&self, session: &Session) -> Option<Cookie<'static>> {
        if !session.is_new() && !session.is_modified() {
            return None;
        }

        let max_age = time::Duration::seconds(self.ttl.as_secs() as i64);
        Some(
            Cookie::build(SESSION_COOKIE_NAME, session.key.to_string())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure_cookies)
                .max_age(max_age)
                .finish(),
        )
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        SessionRecord::delete_expired(&self.db_pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_messages_are_taken_once() {
        let mut session = Session::new();
        assert!(!session.is_modified());

        session.flash(FlashMessage::success("Saved"));
        assert!(session.is_modified());

        let messages = session.take_messages();
        assert_eq!(messages, vec![FlashMessage::success("Saved")]);
        assert!(session.take_messages().is_empty());
    }

    #[test]
    fn touching_the_cart_marks_the_session_modified() {
        let mut session = Session::new();
        session.cart_mut().insert(
            "3".to_string(),
            GuestCartLine {
                quantity: 1,
                name: "ORS".to_string(),
                price: "25.00".to_string(),
                image: String::new(),
            },
        );
        assert!(session.is_modified());
        assert_eq!(session.cart().len(), 1);
    }
}
