use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::services::ContactService;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(default)]
    pub unread: bool,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub is_read: bool,
}

pub async fn list_messages(
    query: web::Query<MessageQuery>,
    contact_service: web::Data<ContactService>,
) -> Result<HttpResponse, AppError> {
    let messages = contact_service.list(query.unread, query.page).await?;
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn mark_read(
    path: web::Path<i64>,
    request: web::Json<ReadRequest>,
    contact_service: web::Data<ContactService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    contact_service.set_read(id, request.is_read).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "is_read": request.is_read })))
}
