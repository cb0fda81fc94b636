use pharmacy_shared::{
    CategoryRequest, MedicineImageRequest, MedicineRequest, MedicineResponse, PaginatedResponse,
    PrescriptionType, DETAIL_PRODUCT_FEEDBACKS, HOME_FEATURED_MEDICINES, HOME_FEEDBACKS, SEARCH_PAGE_SIZE,
    SUGGESTION_MANUFACTURER_LIMIT, SUGGESTION_MEDICINE_LIMIT, SUGGESTION_MIN_QUERY_LEN,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::category::{Category, CategorySummary};
use crate::models::feedback::{CustomerFeedback, ProductFeedback};
use crate::models::medicine::{Medicine, MedicineFilter, MedicineImage, MedicineSort, StockBand};
use crate::models::page_window;

/// Query string accepted by the listing and advanced search pages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub prescription_type: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.map(str::trim).filter(|v| !v.is_empty()).and_then(|v| v.parse().ok())
}

/// Unparseable price bounds are ignored
fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| Decimal::from_str(v).ok())
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on") | Some("true") | Some("1") | Some("yes"))
}

impl SearchParams {
    pub fn to_filter(&self, per_page: i64) -> (MedicineFilter, i64) {
        let (page, limit, offset) = page_window(self.page, per_page);
        let filter = MedicineFilter {
            query: self.q.clone(),
            category_id: parse_id(self.category.as_deref()),
            manufacturer: self.manufacturer.clone(),
            prescription_type: self
                .prescription_type
                .as_deref()
                .and_then(|v| PrescriptionType::from_str(v).ok()),
            min_price: parse_price(self.min_price.as_deref()),
            max_price: parse_price(self.max_price.as_deref()),
            in_stock_only: is_checked(self.in_stock.as_deref()),
            stock_band: None,
            include_inactive: false,
            sort: MedicineSort::parse(self.sort.as_deref()),
            limit,
            offset,
        };
        (filter, page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub featured_medicines: Vec<MedicineResponse>,
    pub categories: Vec<Category>,
    pub feedbacks: Vec<CustomerFeedback>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub results: PaginatedResponse<MedicineResponse>,
    pub categories: Vec<Category>,
    pub manufacturers: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicineDetail {
    pub medicine: MedicineResponse,
    pub images: Vec<MedicineImage>,
    pub feedbacks: Vec<ProductFeedback>,
}

/// Back-office medicine listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminMedicineParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub stock: Option<String>,
    pub page: Option<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    db_pool: PgPool,
}

impl CatalogService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn home(&self) -> Result<HomePage, AppError> {
        let featured = Medicine::featured(&self.db_pool, HOME_FEATURED_MEDICINES).await?;
        let categories = Category::list_all(&self.db_pool).await?;
        let feedbacks = CustomerFeedback::approved(&self.db_pool, HOME_FEEDBACKS).await?;

        Ok(HomePage {
            featured_medicines: featured.iter().map(Medicine::to_response).collect(),
            categories,
            feedbacks,
        })
    }

    /// Listing and advanced search share one query; the listing only ever sends q and category
    pub async fn search(&self, params: &SearchParams) -> Result<SearchPage, AppError> {
        let (filter, page) = params.to_filter(SEARCH_PAGE_SIZE);
        let (medicines, total) = Medicine::search(&self.db_pool, &filter).await?;
        debug!("Medicine search matched {} row(s)", total);

        Ok(SearchPage {
            results: PaginatedResponse::new(
                medicines.iter().map(Medicine::to_response).collect(),
                total,
                page,
                filter.limit,
            ),
            categories: Category::list_all(&self.db_pool).await?,
            manufacturers: Medicine::distinct_manufacturers(&self.db_pool).await?,
        })
    }

    pub async fn detail(&self, medicine_id: i64) -> Result<MedicineDetail, AppError> {
        let medicine = Medicine::find_active_by_id(&self.db_pool, medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))?;
        let images = MedicineImage::list_for_medicine(&self.db_pool, medicine.id).await?;
        let feedbacks =
            ProductFeedback::approved_for_medicine(&self.db_pool, medicine.id, DETAIL_PRODUCT_FEEDBACKS).await?;

        Ok(MedicineDetail {
            medicine: medicine.to_response(),
            images,
            feedbacks,
        })
    }

    /// Medicine names first, then manufacturers; short queries get nothing
    pub async fn suggestions(&self, query: &str) -> Result<Vec<String>, AppError> {
        let query = query.trim();
        if query.chars().count() < SUGGESTION_MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let mut suggestions = Medicine::name_suggestions(&self.db_pool, query, SUGGESTION_MEDICINE_LIMIT).await?;
        suggestions.extend(
            Medicine::manufacturer_suggestions(&self.db_pool, query, SUGGESTION_MANUFACTURER_LIMIT).await?,
        );
        Ok(suggestions)
    }

    // Back-office: categories

    pub async fn list_categories(&self, search: Option<&str>) -> Result<Vec<CategorySummary>, AppError> {
        Category::list_with_counts(&self.db_pool, search.filter(|s| !s.trim().is_empty())).await
    }

    async fn ensure_unique_category_name(&self, name: &str, except_id: Option<i64>) -> Result<(), AppError> {
        if Category::name_exists(&self.db_pool, name, except_id).await? {
            return Err(AppError::field("name", "A category with this name already exists"));
        }
        Ok(())
    }

    pub async fn create_category(&self, request: &CategoryRequest) -> Result<Category, AppError> {
        self.ensure_unique_category_name(&request.name, None).await?;
        let category = Category::create(&self.db_pool, request).await?;
        info!("Created category {} ({})", category.id, category.name);
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, request: &CategoryRequest) -> Result<Category, AppError> {
        self.ensure_unique_category_name(&request.name, Some(id)).await?;
        Category::update(&self.db_pool, id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        if !Category::delete(&self.db_pool, id).await? {
            return Err(AppError::NotFound("Category not found".to_string()));
        }
        info!("Deleted category {}", id);
        Ok(())
    }

    // Back-office: medicines

    pub async fn admin_medicines(&self, params: &AdminMedicineParams) -> Result<PaginatedResponse<MedicineResponse>, AppError> {
        let (page, limit, offset) = page_window(params.page, pharmacy_shared::DEFAULT_PAGE_SIZE);
        let stock_band = match params.stock.as_deref() {
            Some("out_of_stock") => Some(StockBand::OutOfStock),
            Some("low_stock") => Some(StockBand::LowStock),
            Some("in_stock") => Some(StockBand::InStock),
            _ => None,
        };
        let filter = MedicineFilter {
            query: params.search.clone(),
            category_id: parse_id(params.category.as_deref()),
            stock_band,
            include_inactive: true,
            sort: MedicineSort::Newest,
            limit,
            offset,
            ..MedicineFilter::default()
        };

        let (medicines, total) = Medicine::search(&self.db_pool, &filter).await?;
        Ok(PaginatedResponse::new(
            medicines.iter().map(Medicine::to_response).collect(),
            total,
            page,
            limit,
        ))
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), AppError> {
        if Category::find_by_id(&self.db_pool, category_id).await?.is_none() {
            return Err(AppError::field("category_id", "Category does not exist"));
        }
        Ok(())
    }

    pub async fn create_medicine(&self, request: &MedicineRequest) -> Result<MedicineResponse, AppError> {
        self.ensure_category(request.category_id).await?;
        let medicine = Medicine::create(&self.db_pool, request).await?;
        info!("Created medicine {} ({})", medicine.id, medicine.name);
        Ok(medicine.to_response())
    }

    pub async fn update_medicine(&self, id: i64, request: &MedicineRequest) -> Result<MedicineResponse, AppError> {
        self.ensure_category(request.category_id).await?;
        let medicine = Medicine::update(&self.db_pool, id, request)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))?;
        Ok(medicine.to_response())
    }

    pub async fn delete_medicine(&self, id: i64) -> Result<(), AppError> {
        if !Medicine::delete(&self.db_pool, id).await? {
            return Err(AppError::NotFound("Medicine not found".to_string()));
        }
        info!("Deleted medicine {}", id);
        Ok(())
    }

    pub async fn update_stock(&self, id: i64, quantity: i32) -> Result<MedicineResponse, AppError> {
        if !Medicine::update_stock_quantity(&self.db_pool, id, quantity).await? {
            return Err(AppError::NotFound("Medicine not found".to_string()));
        }
        info!("Stock for medicine {} set to {}", id, quantity);
        let medicine = Medicine::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))?;
        Ok(medicine.to_response())
    }

    // Back-office: gallery

    pub async fn medicine_images(&self, medicine_id: i64) -> Result<Vec<MedicineImage>, AppError> {
        MedicineImage::list_for_medicine(&self.db_pool, medicine_id).await
    }

    pub async fn add_image(&self, medicine_id: i64, request: &MedicineImageRequest) -> Result<MedicineImage, AppError> {
        if Medicine::find_by_id(&self.db_pool, medicine_id).await?.is_none() {
            return Err(AppError::NotFound("Medicine not found".to_string()));
        }
        MedicineImage::create(&self.db_pool, medicine_id, request).await
    }

    pub async fn set_primary_image(&self, medicine_id: i64, image_id: i64) -> Result<(), AppError> {
        if !MedicineImage::set_primary(&self.db_pool, medicine_id, image_id).await? {
            return Err(AppError::NotFound("Image not found".to_string()));
        }
        Ok(())
    }

    pub async fn delete_image(&self, medicine_id: i64, image_id: i64) -> Result<(), AppError> {
        if !MedicineImage::delete(&self.db_pool, medicine_id, image_id).await? {
            return Err(AppError::NotFound("Image not found".to_string()));
        }
        Ok(())
    }
}
