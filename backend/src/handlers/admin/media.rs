use actix_web::{web, HttpResponse};
use pharmacy_shared::MediaVideoRequest;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::StaffUser;
use crate::services::media_service::VideoListParams;
use crate::services::MediaService;

pub async fn list_videos(
    query: web::Query<VideoListParams>,
    media_service: web::Data<MediaService>,
) -> Result<HttpResponse, AppError> {
    let videos = media_service.list(&query).await?;
    Ok(HttpResponse::Ok().json(videos))
}

pub async fn get_video(
    path: web::Path<i64>,
    media_service: web::Data<MediaService>,
) -> Result<HttpResponse, AppError> {
    let video = media_service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(video))
}

pub async fn create_video(
    staff: StaffUser,
    request: web::Json<MediaVideoRequest>,
    media_service: web::Data<MediaService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let video = media_service.create(&request).await?;
    info!("Staff {} added video {}", staff.user_id, video.id);
    Ok(HttpResponse::Created().json(video))
}

pub async fn update_video(
    path: web::Path<i64>,
    request: web::Json<MediaVideoRequest>,
    media_service: web::Data<MediaService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let video = media_service.update(path.into_inner(), &request).await?;
    Ok(HttpResponse::Ok().json(video))
}

pub async fn delete_video(
    path: web::Path<i64>,
    media_service: web::Data<MediaService>,
) -> Result<HttpResponse, AppError> {
    media_service.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
