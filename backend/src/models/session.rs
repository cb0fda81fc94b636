use chrono::{DateTime, Utc};
use pharmacy_shared::FlashMessage;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::AppError;

/// One guest cart line as stored in the session.
/// Name, price and image are snapshots taken when the line was first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartLine {
    pub quantity: i32,
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub image: String,
}

/// Everything kept server-side for a browser session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// medicine id (as a string) -> line
    #[serde(default)]
    pub cart: BTreeMap<String, GuestCartLine>,
    #[serde(default)]
    pub messages: Vec<FlashMessage>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub session_key: Uuid,
    pub data: Json<SessionData>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Load a session that has not expired yet
    pub async fn find_live(pool: &PgPool, session_key: Uuid) -> Result<Option<Self>, AppError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT session_key, data, expires_at FROM sessions WHERE session_key = $1 AND expires_at > NOW()",
        )
        .bind(session_key)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Re-read a live session and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, session_key: Uuid) -> Result<Option<Self>, AppError> {
        let record = sqlx::query_as::<_, SessionRecord>(
            r#"
            SELECT session_key, data, expires_at FROM sessions
            WHERE session_key = $1 AND expires_at > NOW()
            FOR UPDATE
            "#,
        )
        .bind(session_key)
        .fetch_optional(conn)
        .await?;

        Ok(record)
    }

    /// Insert or overwrite the session row. Last write wins.
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        session_key: Uuid,
        data: &SessionData,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_key, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_key) DO UPDATE SET
                data = EXCLUDED.data,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            "#,
        )
        .bind(session_key)
        .bind(Json(data))
        .bind(expires_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn delete_expired(pool: &PgPool) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
