use chrono::{DateTime, NaiveDate, Utc};
use pharmacy_shared::{MedicineImageRequest, MedicineRequest, MedicineResponse, PrescriptionType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;
use crate::utils::currency::format_rupees_simple;

const MEDICINE_COLUMNS: &str = "id, name, category_id, description, mrp, price, stock_quantity, \
    prescription_type, manufacturer, expiry_date, image, is_active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub description: String,
    pub mrp: Decimal,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub prescription_type: PrescriptionType,
    pub manufacturer: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MedicineImage {
    pub id: i64,
    pub medicine_id: i64,
    pub image: String,
    pub alt_text: String,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicineSort {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    Newest,
}

impl MedicineSort {
    /// Unknown sort keys fall back to name ordering
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("price_low") => MedicineSort::PriceLow,
            Some("price_high") => MedicineSort::PriceHigh,
            Some("newest") => MedicineSort::Newest,
            _ => MedicineSort::Name,
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            MedicineSort::Name => " ORDER BY name ASC, id ASC",
            MedicineSort::PriceLow => " ORDER BY price ASC, id ASC",
            MedicineSort::PriceHigh => " ORDER BY price DESC, id ASC",
            MedicineSort::Newest => " ORDER BY created_at DESC, id DESC",
        }
    }
}

/// Stock bands used by the back-office listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    OutOfStock,
    LowStock,
    InStock,
}

#[derive(Debug, Clone, Default)]
pub struct MedicineFilter {
    pub query: Option<String>,
    pub category_id: Option<i64>,
    pub manufacturer: Option<String>,
    pub prescription_type: Option<PrescriptionType>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock_only: bool,
    pub stock_band: Option<StockBand>,
    pub include_inactive: bool,
    pub sort: MedicineSort,
    pub limit: i64,
    pub offset: i64,
}

impl MedicineFilter {
    fn push_conditions<'a>(&'a self, builder: &mut QueryBuilder<'a, Postgres>) {
        builder.push(" WHERE 1=1");

        if !self.include_inactive {
            builder.push(" AND is_active = TRUE");
        }

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", query);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR manufacturer ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(category_id) = self.category_id {
            builder.push(" AND category_id = ");
            builder.push_bind(category_id);
        }

        if let Some(manufacturer) = self.manufacturer.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            builder.push(" AND manufacturer ILIKE ");
            builder.push_bind(format!("%{}%", manufacturer));
        }

        if let Some(prescription_type) = self.prescription_type {
            builder.push(" AND prescription_type = ");
            builder.push_bind(prescription_type);
        }

        if let Some(min_price) = self.min_price {
            builder.push(" AND price >= ");
            builder.push_bind(min_price);
        }

        if let Some(max_price) = self.max_price {
            builder.push(" AND price <= ");
            builder.push_bind(max_price);
        }

        if self.in_stock_only {
            builder.push(" AND stock_quantity > 0");
        }

        match self.stock_band {
            Some(StockBand::OutOfStock) => {
                builder.push(" AND stock_quantity = 0");
            }
            Some(StockBand::LowStock) => {
                builder.push(" AND stock_quantity > 0 AND stock_quantity <= ");
                builder.push_bind(pharmacy_shared::LOW_STOCK_THRESHOLD);
            }
            Some(StockBand::InStock) => {
                builder.push(" AND stock_quantity > ");
                builder.push_bind(pharmacy_shared::LOW_STOCK_THRESHOLD);
            }
            None => {}
        }
    }
}

impl Medicine {
    pub async fn create(pool: &PgPool, request: &MedicineRequest) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO medicines (name, category_id, description, mrp, price, stock_quantity,
                prescription_type, manufacturer, expiry_date, image, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            MEDICINE_COLUMNS
        );

        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(request.name.trim())
            .bind(request.category_id)
            .bind(&request.description)
            .bind(request.mrp)
            .bind(request.price)
            .bind(request.stock_quantity)
            .bind(request.prescription_type)
            .bind(&request.manufacturer)
            .bind(request.expiry_date)
            .bind(&request.image)
            .bind(request.is_active)
            .fetch_one(pool)
            .await?;

        Ok(medicine)
    }

    pub async fn update(pool: &PgPool, id: i64, request: &MedicineRequest) -> Result<Option<Self>, AppError> {
        let sql = format!(
            r#"
            UPDATE medicines SET
                name = $1, category_id = $2, description = $3, mrp = $4, price = $5,
                stock_quantity = $6, prescription_type = $7, manufacturer = $8,
                expiry_date = $9, image = $10, is_active = $11, updated_at = NOW()
            WHERE id = $12
            RETURNING {}
            "#,
            MEDICINE_COLUMNS
        );

        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(request.name.trim())
            .bind(request.category_id)
            .bind(&request.description)
            .bind(request.mrp)
            .bind(request.price)
            .bind(request.stock_quantity)
            .bind(request.prescription_type)
            .bind(&request.manufacturer)
            .bind(request.expiry_date)
            .bind(&request.image)
            .bind(request.is_active)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(medicine)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM medicines WHERE id = $1", MEDICINE_COLUMNS);
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(medicine)
    }

    /// Find a medicine that is visible on the storefront
    pub async fn find_active_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        Ok(Self::find_by_id(pool, id).await?.filter(|m| m.is_active))
    }

    /// Load many medicines at once; ids that do not exist are simply absent
    pub async fn find_by_ids(executor: impl PgExecutor<'_>, ids: &[i64]) -> Result<Vec<Self>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {} FROM medicines WHERE id = ANY($1)", MEDICINE_COLUMNS);
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(medicines)
    }

    pub async fn featured(pool: &PgPool, limit: i64) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE is_active = TRUE ORDER BY id LIMIT $1",
            MEDICINE_COLUMNS
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(medicines)
    }

    /// Filtered listing plus the total number of matches
    pub async fn search(pool: &PgPool, filter: &MedicineFilter) -> Result<(Vec<Self>, i64), AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM medicines");
        filter.push_conditions(&mut count_builder);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM medicines", MEDICINE_COLUMNS));
        filter.push_conditions(&mut builder);
        builder.push(filter.sort.order_clause());
        builder.push(" LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let medicines = builder.build_query_as::<Medicine>().fetch_all(pool).await?;

        Ok((medicines, total))
    }

    pub async fn name_suggestions(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM medicines WHERE is_active = TRUE AND name ILIKE $1 ORDER BY name LIMIT $2",
        )
        .bind(format!("%{}%", query))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(names)
    }

    pub async fn manufacturer_suggestions(pool: &PgPool, query: &str, limit: i64) -> Result<Vec<String>, AppError> {
        let manufacturers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT manufacturer FROM medicines
            WHERE is_active = TRUE AND manufacturer IS NOT NULL AND manufacturer ILIKE $1
            ORDER BY manufacturer
            LIMIT $2
            "#,
        )
        .bind(format!("%{}%", query))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(manufacturers)
    }

    pub async fn distinct_manufacturers(pool: &PgPool) -> Result<Vec<String>, AppError> {
        let manufacturers = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT manufacturer FROM medicines WHERE manufacturer IS NOT NULL ORDER BY manufacturer",
        )
        .fetch_all(pool)
        .await?;

        Ok(manufacturers)
    }

    /// Manual stock adjustment. Checkout never touches stock.
    pub async fn update_stock_quantity(pool: &PgPool, id: i64, quantity: i32) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE medicines SET stock_quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(quantity)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn discount_percentage(&self) -> i64 {
        if self.mrp > Decimal::ZERO && self.mrp > self.price {
            ((self.mrp - self.price) / self.mrp * Decimal::from(100))
                .trunc()
                .to_i64()
                .unwrap_or(0)
        } else {
            0
        }
    }

    pub fn savings(&self) -> Decimal {
        if self.mrp > self.price {
            self.mrp - self.price
        } else {
            Decimal::ZERO
        }
    }

    pub fn image_url(&self) -> String {
        self.image.clone().unwrap_or_default()
    }

    pub fn to_response(&self) -> MedicineResponse {
        MedicineResponse {
            id: self.id,
            name: self.name.clone(),
            category_id: self.category_id,
            description: self.description.clone(),
            mrp: self.mrp,
            price: self.price,
            price_display: format_rupees_simple(self.price),
            discount_percentage: self.discount_percentage(),
            savings: self.savings(),
            stock_quantity: self.stock_quantity,
            in_stock: self.stock_quantity > 0,
            prescription_type: self.prescription_type,
            prescription_label: self.prescription_type.label().to_string(),
            manufacturer: self.manufacturer.clone(),
            expiry_date: self.expiry_date,
            image: self.image.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl MedicineImage {
    /// Gallery images, primary first then newest
    pub async fn list_for_medicine(pool: &PgPool, medicine_id: i64) -> Result<Vec<Self>, AppError> {
        let images = sqlx::query_as::<_, MedicineImage>(
            r#"
            SELECT id, medicine_id, image, alt_text, is_primary, uploaded_at
            FROM medicine_images
            WHERE medicine_id = $1
            ORDER BY is_primary DESC, uploaded_at DESC
            "#,
        )
        .bind(medicine_id)
        .fetch_all(pool)
        .await?;

        Ok(images)
    }

    /// Add a gallery image. A new primary image demotes the previous one.
    pub async fn create(pool: &PgPool, medicine_id: i64, request: &MedicineImageRequest) -> Result<Self, AppError> {
        let mut tx = pool.begin().await?;

        if request.is_primary {
            Self::clear_primary(&mut *tx, medicine_id).await?;
        }

        let image = sqlx::query_as::<_, MedicineImage>(
            r#"
            INSERT INTO medicine_images (medicine_id, image, alt_text, is_primary)
            VALUES ($1, $2, $3, $4)
            RETURNING id, medicine_id, image, alt_text, is_primary, uploaded_at
            "#,
        )
        .bind(medicine_id)
        .bind(&request.image)
        .bind(&request.alt_text)
        .bind(request.is_primary)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(image)
    }

    pub async fn set_primary(pool: &PgPool, medicine_id: i64, image_id: i64) -> Result<bool, AppError> {
        let mut tx = pool.begin().await?;
        Self::clear_primary(&mut *tx, medicine_id).await?;

        let result = sqlx::query("UPDATE medicine_images SET is_primary = TRUE WHERE id = $1 AND medicine_id = $2")
            .bind(image_id)
            .bind(medicine_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete(pool: &PgPool, medicine_id: i64, image_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM medicine_images WHERE id = $1 AND medicine_id = $2")
            .bind(image_id)
            .bind(medicine_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_primary(executor: impl PgExecutor<'_>, medicine_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE medicine_images SET is_primary = FALSE WHERE medicine_id = $1 AND is_primary = TRUE")
            .bind(medicine_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
