use actix_web::{web, HttpResponse};
use pharmacy_shared::{FeedbackAction, FeedbackKind};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::middleware::StaffUser;
use crate::services::feedback_service::FeedbackListParams;
use crate::services::FeedbackService;

#[derive(Debug, Deserialize)]
pub struct FeedbackActionRequest {
    #[serde(rename = "type", default)]
    pub kind: FeedbackKind,
    pub action: FeedbackAction,
}

pub async fn list_feedbacks(
    query: web::Query<FeedbackListParams>,
    feedback_service: web::Data<FeedbackService>,
) -> Result<HttpResponse, AppError> {
    let listing = feedback_service.list(&query).await?;
    Ok(HttpResponse::Ok().json(listing))
}

pub async fn feedback_action(
    staff: StaffUser,
    path: web::Path<i64>,
    request: web::Json<FeedbackActionRequest>,
    feedback_service: web::Data<FeedbackService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    tracing::debug!("Staff {} moderating feedback {}", staff.user_id, id);
    let message = feedback_service.apply_action(request.kind, id, request.action).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}
