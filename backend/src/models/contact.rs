use chrono::{DateTime, Utc};
use pharmacy_shared::ContactForm;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub async fn create(pool: &PgPool, form: &ContactForm, ip_address: Option<&str>) -> Result<Self, AppError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (name, email, subject, message, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, subject, message, is_read, ip_address, created_at
            "#,
        )
        .bind(form.name.trim())
        .bind(form.email.trim())
        .bind(form.subject.trim())
        .bind(form.message.trim())
        .bind(ip_address)
        .fetch_one(pool)
        .await?;

        Ok(message)
    }

    pub async fn list(pool: &PgPool, unread_only: bool, limit: i64, offset: i64) -> Result<(Vec<Self>, i64), AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM contact_messages WHERE ($1 = FALSE OR is_read = FALSE)",
        )
        .bind(unread_only)
        .fetch_one(pool)
        .await?;

        let messages = sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT id, name, email, subject, message, is_read, ip_address, created_at
            FROM contact_messages
            WHERE ($1 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok((messages, total))
    }

    pub async fn set_read(pool: &PgPool, id: i64, is_read: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE contact_messages SET is_read = $1 WHERE id = $2")
            .bind(is_read)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
