use actix_web::{web, HttpResponse};
use chrono::Utc;
use pharmacy_shared::{AdminOrderRequest, BulkStatusRequest, StatusUpdateRequest};
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::StaffUser;
use crate::services::order_service::OrderListParams;
use crate::services::OrderService;

pub async fn list_orders(
    query: web::Query<OrderListParams>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let (filter, page) = query.to_filter(Utc::now());
    let orders = order_service.search(&filter, page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn get_order(
    path: web::Path<i64>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn create_order(
    staff: StaffUser,
    request: web::Json<AdminOrderRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let order = order_service.create_admin_order(&request).await?;
    info!("Staff {} created order {}", staff.user_id, order.id);
    Ok(HttpResponse::Created().json(order))
}

/// Replaces every item of the order
pub async fn update_order(
    staff: StaffUser,
    path: web::Path<i64>,
    request: web::Json<AdminOrderRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let order = order_service
        .update_admin_order(path.into_inner(), &request)
        .await?;
    info!("Staff {} edited order {}", staff.user_id, order.id);
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_status(
    path: web::Path<i64>,
    request: web::Json<StatusUpdateRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service
        .update_status(path.into_inner(), &request.status)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Order #{} status updated to {}", order.id, order.status_label),
        "order": order,
    })))
}

pub async fn bulk_update_status(
    staff: StaffUser,
    request: web::Json<BulkStatusRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let updated = order_service
        .bulk_update_status(&request.order_ids, &request.status)
        .await?;
    info!("Staff {} bulk-updated {} order(s)", staff.user_id, updated);
    Ok(HttpResponse::Ok().json(json!({
        "updated": updated,
        "message": format!("{} orders updated to {}", updated, request.status.trim().to_uppercase()),
    })))
}

pub async fn delete_order(
    staff: StaffUser,
    path: web::Path<i64>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    order_service.delete(id).await?;
    info!("Staff {} deleted order {}", staff.user_id, id);
    Ok(HttpResponse::NoContent().finish())
}
