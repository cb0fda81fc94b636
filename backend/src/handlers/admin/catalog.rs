use actix_web::{web, HttpResponse};
use pharmacy_shared::{CategoryRequest, MedicineImageRequest, MedicineRequest, StockUpdateRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::StaffUser;
use crate::services::catalog_service::AdminMedicineParams;
use crate::services::CatalogService;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub search: Option<String>,
}

pub async fn list_categories(
    query: web::Query<CategoryQuery>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let categories = catalog_service.list_categories(query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn create_category(
    staff: StaffUser,
    request: web::Json<CategoryRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let category = catalog_service.create_category(&request).await?;
    info!("Staff {} created category {}", staff.user_id, category.id);
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    path: web::Path<i64>,
    request: web::Json<CategoryRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let category = catalog_service.update_category(path.into_inner(), &request).await?;
    Ok(HttpResponse::Ok().json(category))
}

/// Refused with 409 while medicines still reference the category
pub async fn delete_category(
    staff: StaffUser,
    path: web::Path<i64>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    catalog_service.delete_category(id).await?;
    info!("Staff {} deleted category {}", staff.user_id, id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_medicines(
    query: web::Query<AdminMedicineParams>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let medicines = catalog_service.admin_medicines(&query).await?;
    Ok(HttpResponse::Ok().json(medicines))
}

pub async fn create_medicine(
    staff: StaffUser,
    request: web::Json<MedicineRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let medicine = catalog_service.create_medicine(&request).await?;
    info!("Staff {} created medicine {}", staff.user_id, medicine.id);
    Ok(HttpResponse::Created().json(medicine))
}

pub async fn update_medicine(
    path: web::Path<i64>,
    request: web::Json<MedicineRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let medicine = catalog_service.update_medicine(path.into_inner(), &request).await?;
    Ok(HttpResponse::Ok().json(medicine))
}

pub async fn delete_medicine(
    staff: StaffUser,
    path: web::Path<i64>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    catalog_service.delete_medicine(id).await?;
    info!("Staff {} deleted medicine {}", staff.user_id, id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn update_stock(
    path: web::Path<i64>,
    request: web::Json<StockUpdateRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let medicine = catalog_service
        .update_stock(path.into_inner(), request.stock_quantity)
        .await?;
    Ok(HttpResponse::Ok().json(medicine))
}

pub async fn list_images(
    path: web::Path<i64>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let images = catalog_service.medicine_images(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn add_image(
    path: web::Path<i64>,
    request: web::Json<MedicineImageRequest>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let image = catalog_service.add_image(path.into_inner(), &request).await?;
    Ok(HttpResponse::Created().json(image))
}

pub async fn set_primary_image(
    path: web::Path<(i64, i64)>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let (medicine_id, image_id) = path.into_inner();
    catalog_service.set_primary_image(medicine_id, image_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Primary image updated" })))
}

pub async fn delete_image(
    path: web::Path<(i64, i64)>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let (medicine_id, image_id) = path.into_inner();
    catalog_service.delete_image(medicine_id, image_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
