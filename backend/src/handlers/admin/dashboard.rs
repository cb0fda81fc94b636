use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::services::DashboardService;

pub async fn overview(dashboard_service: web::Data<DashboardService>) -> Result<HttpResponse, AppError> {
    let dashboard = dashboard_service.overview().await?;
    Ok(HttpResponse::Ok().json(dashboard))
}
