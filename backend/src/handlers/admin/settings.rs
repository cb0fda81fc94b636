use actix_web::{web, HttpResponse};
use pharmacy_shared::SiteSettingsForm;
use tracing::info;

use crate::error::AppError;
use crate::middleware::StaffUser;
use crate::services::SettingsService;

pub async fn get_settings(settings_service: web::Data<SettingsService>) -> Result<HttpResponse, AppError> {
    let settings = settings_service.get().await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// Every field is checked; all errors come back together
pub async fn update_settings(
    staff: StaffUser,
    form: web::Json<SiteSettingsForm>,
    settings_service: web::Data<SettingsService>,
) -> Result<HttpResponse, AppError> {
    let settings = settings_service.update(&form).await?;
    info!("Staff {} updated site settings", staff.user_id);
    Ok(HttpResponse::Ok().json(settings))
}
