use chrono::{DateTime, Utc};
use pharmacy_shared::SITE_SETTINGS_ID;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

const SETTINGS_COLUMNS: &str = "id, facebook_url, instagram_url, youtube_url, twitter_url, linkedin_url, \
    whatsapp_number, website_url, created_at, updated_at";

/// Site-wide social links. There is exactly one row, id 1.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SiteSettings {
    pub id: i32,
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cleaned values ready to be stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub youtube_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub website_url: Option<String>,
}

impl SiteSettings {
    /// Load the settings row, creating the empty record on first use
    pub async fn get_or_create(pool: &PgPool) -> Result<Self, AppError> {
        sqlx::query("INSERT INTO site_settings (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(SITE_SETTINGS_ID)
            .execute(pool)
            .await?;

        let sql = format!("SELECT {} FROM site_settings WHERE id = $1", SETTINGS_COLUMNS);
        let settings = sqlx::query_as::<_, SiteSettings>(&sql)
            .bind(SITE_SETTINGS_ID)
            .fetch_one(pool)
            .await?;

        Ok(settings)
    }

    pub async fn save(pool: &PgPool, update: &SettingsUpdate) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO site_settings (id, facebook_url, instagram_url, youtube_url, twitter_url,
                linkedin_url, whatsapp_number, website_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                facebook_url = EXCLUDED.facebook_url,
                instagram_url = EXCLUDED.instagram_url,
                youtube_url = EXCLUDED.youtube_url,
                twitter_url = EXCLUDED.twitter_url,
                linkedin_url = EXCLUDED.linkedin_url,
                whatsapp_number = EXCLUDED.whatsapp_number,
                website_url = EXCLUDED.website_url,
                updated_at = NOW()
            RETURNING {}
            "#,
            SETTINGS_COLUMNS
        );

        let settings = sqlx::query_as::<_, SiteSettings>(&sql)
            .bind(SITE_SETTINGS_ID)
            .bind(&update.facebook_url)
            .bind(&update.instagram_url)
            .bind(&update.youtube_url)
            .bind(&update.twitter_url)
            .bind(&update.linkedin_url)
            .bind(&update.whatsapp_number)
            .bind(&update.website_url)
            .fetch_one(pool)
            .await?;

        Ok(settings)
    }
}
