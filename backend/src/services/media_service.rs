use pharmacy_shared::{MediaVideoRequest, MediaVideoResponse, PaginatedResponse, VideoType};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::info;

use crate::error::AppError;
use crate::models::media::{MediaVideo, VideoFilter, VideoStatus};
use crate::models::page_window;

const ADMIN_VIDEOS_PER_PAGE: i64 = 12;

/// Storefront gallery, split the way the media page shows it
#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaGallery {
    pub videos: Vec<MediaVideoResponse>,
    pub featured: Vec<MediaVideoResponse>,
    pub reels: Vec<MediaVideoResponse>,
    pub promos: Vec<MediaVideoResponse>,
    pub testimonials: Vec<MediaVideoResponse>,
}

impl MediaGallery {
    /// Group already-ordered active videos
    pub fn from_videos(videos: &[MediaVideo]) -> Self {
        let pick = |keep: &dyn Fn(&MediaVideo) -> bool| -> Vec<MediaVideoResponse> {
            videos.iter().filter(|v| keep(*v)).map(MediaVideo::to_response).collect()
        };

        Self {
            videos: pick(&|_| true),
            featured: pick(&|v| v.is_featured),
            reels: pick(&|v| v.video_type == VideoType::Reel),
            promos: pick(&|v| v.video_type == VideoType::Promo),
            testimonials: pick(&|v| v.video_type == VideoType::Testimonial),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListParams {
    #[serde(rename = "type")]
    pub video_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
}

#[derive(Clone)]
pub struct MediaService {
    db_pool: PgPool,
}

impl MediaService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn gallery(&self) -> Result<MediaGallery, AppError> {
        let videos = MediaVideo::list_active(&self.db_pool).await?;
        Ok(MediaGallery::from_videos(&videos))
    }

    pub async fn list(&self, params: &VideoListParams) -> Result<PaginatedResponse<MediaVideoResponse>, AppError> {
        let (page, limit, offset) = page_window(params.page, ADMIN_VIDEOS_PER_PAGE);
        let filter = VideoFilter {
            video_type: params
                .video_type
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .and_then(|t| VideoType::from_str(t).ok()),
            status: params.status.as_deref().and_then(VideoStatus::parse),
            search: params.search.clone(),
            limit,
            offset,
        };

        let (videos, total) = MediaVideo::search(&self.db_pool, &filter).await?;
        Ok(PaginatedResponse::new(
            videos.iter().map(MediaVideo::to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    pub async fn get(&self, id: i64) -> Result<MediaVideoResponse, AppError> {
        MediaVideo::find_by_id(&self.db_pool, id)
            .await?
            .map(|v| v.to_response())
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    pub async fn create(&self, request: &MediaVideoRequest) -> Result<MediaVideoResponse, AppError> {
        let video = MediaVideo::create(&self.db_pool, request).await?;
        info!("Created media video {} ({})", video.id, video.title);
        Ok(video.to_response())
    }

    pub async fn update(&self, id: i64, request: &MediaVideoRequest) -> Result<MediaVideoResponse, AppError> {
        MediaVideo::update(&self.db_pool, id, request)
            .await?
            .map(|v| v.to_response())
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if !MediaVideo::delete(&self.db_pool, id).await? {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
        info!("Deleted media video {}", id);
        Ok(())
    }
}
