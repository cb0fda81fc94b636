use chrono::{DateTime, Utc};
use pharmacy_shared::{MediaVideoRequest, MediaVideoResponse, VideoType};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;

const VIDEO_COLUMNS: &str = "id, title, description, video_type, video_file, video_url, thumbnail, \
    is_featured, is_active, display_order, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MediaVideo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub video_type: VideoType,
    pub video_file: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Active,
    Inactive,
    Featured,
}

impl VideoStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(VideoStatus::Active),
            "inactive" => Some(VideoStatus::Inactive),
            "featured" => Some(VideoStatus::Featured),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub video_type: Option<VideoType>,
    pub status: Option<VideoStatus>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl VideoFilter {
    fn push_conditions<'a>(&'a self, builder: &mut QueryBuilder<'a, Postgres>) {
        builder.push(" WHERE 1=1");

        if let Some(video_type) = self.video_type {
            builder.push(" AND video_type = ");
            builder.push_bind(video_type);
        }

        match self.status {
            Some(VideoStatus::Active) => {
                builder.push(" AND is_active = TRUE");
            }
            Some(VideoStatus::Inactive) => {
                builder.push(" AND is_active = FALSE");
            }
            Some(VideoStatus::Featured) => {
                builder.push(" AND is_featured = TRUE");
            }
            None => {}
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

/// Turn a YouTube or Instagram share link into something an iframe can load
pub fn embed_url(video_url: &str) -> String {
    if video_url.contains("youtube.com/watch") {
        if let Some((_, rest)) = video_url.split_once("v=") {
            let id = rest.split('&').next().unwrap_or(rest);
            return format!("https://www.youtube.com/embed/{}", id);
        }
    } else if let Some((_, rest)) = video_url.split_once("youtu.be/") {
        let id = rest.split('?').next().unwrap_or(rest);
        return format!("https://www.youtube.com/embed/{}", id);
    } else if video_url.contains("youtube.com/shorts/") {
        if let Some((_, rest)) = video_url.split_once("shorts/") {
            let id = rest.split('?').next().unwrap_or(rest);
            return format!("https://www.youtube.com/embed/{}", id);
        }
    } else if video_url.contains("instagram.com/reel/") || video_url.contains("instagram.com/p/") {
        return format!("{}embed/", video_url);
    }

    video_url.to_string()
}

impl MediaVideo {
    /// Storefront gallery: active videos by display order, newest first within an order slot
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM media_videos WHERE is_active = TRUE ORDER BY display_order, created_at DESC",
            VIDEO_COLUMNS
        );
        let videos = sqlx::query_as::<_, MediaVideo>(&sql).fetch_all(pool).await?;

        Ok(videos)
    }

    pub async fn search(pool: &PgPool, filter: &VideoFilter) -> Result<(Vec<Self>, i64), AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM media_videos");
        filter.push_conditions(&mut count_builder);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM media_videos", VIDEO_COLUMNS));
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY display_order, created_at DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let videos = builder.build_query_as::<MediaVideo>().fetch_all(pool).await?;
        Ok((videos, total))
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM media_videos WHERE id = $1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<_, MediaVideo>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(video)
    }

    pub async fn create(pool: &PgPool, request: &MediaVideoRequest) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO media_videos (title, description, video_type, video_file, video_url,
                thumbnail, is_featured, is_active, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<_, MediaVideo>(&sql)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(request.video_type)
            .bind(&request.video_file)
            .bind(&request.video_url)
            .bind(&request.thumbnail)
            .bind(request.is_featured)
            .bind(request.is_active)
            .bind(request.display_order)
            .fetch_one(pool)
            .await?;

        Ok(video)
    }

    pub async fn update(pool: &PgPool, id: i64, request: &MediaVideoRequest) -> Result<Option<Self>, AppError> {
        let sql = format!(
            r#"
            UPDATE media_videos SET title = $1, description = $2, video_type = $3, video_file = $4,
                video_url = $5, thumbnail = $6, is_featured = $7, is_active = $8,
                display_order = $9, updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<_, MediaVideo>(&sql)
            .bind(request.title.trim())
            .bind(&request.description)
            .bind(request.video_type)
            .bind(&request.video_file)
            .bind(&request.video_url)
            .bind(&request.thumbnail)
            .bind(request.is_featured)
            .bind(request.is_active)
            .bind(request.display_order)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(video)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media_videos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn embed_url(&self) -> Option<String> {
        self.video_url.as_deref().filter(|u| !u.is_empty()).map(embed_url)
    }

    pub fn to_response(&self) -> MediaVideoResponse {
        MediaVideoResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            video_type: self.video_type,
            video_type_label: self.video_type.label().to_string(),
            video_file: self.video_file.clone(),
            video_url: self.video_url.clone(),
            embed_url: self.embed_url(),
            thumbnail: self.thumbnail.clone(),
            is_featured: self.is_featured,
            is_active: self.is_active,
            display_order: self.display_order,
            created_at: self.created_at,
        }
    }
}
