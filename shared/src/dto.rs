use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("negative_amount"));
    }
    if value.scale() > 2 {
        return Err(ValidationError::new("too_many_decimal_places"));
    }
    Ok(())
}

/// Optional form email: an empty field means "not given"
fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || validator::validate_email(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

// Catalog DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MedicineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub category_id: i64,

    #[serde(default)]
    pub description: String,

    #[validate(custom = "validate_money")]
    pub mrp: Decimal,

    #[validate(custom = "validate_money")]
    pub price: Decimal,

    #[validate(range(min = 0))]
    pub stock_quantity: i32,

    #[serde(default)]
    pub prescription_type: PrescriptionType,

    #[validate(length(max = 100))]
    pub manufacturer: Option<String>,

    pub expiry_date: Option<NaiveDate>,

    pub image: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StockUpdateRequest {
    #[validate(range(min = 0))]
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MedicineImageRequest {
    #[validate(length(min = 1, max = 500))]
    pub image: String,

    #[validate(length(max = 200))]
    #[serde(default)]
    pub alt_text: String,

    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineResponse {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub description: String,
    pub mrp: Decimal,
    pub price: Decimal,
    pub price_display: String,
    pub discount_percentage: i64,
    pub savings: Decimal,
    pub stock_quantity: i32,
    pub in_stock: bool,
    pub prescription_type: PrescriptionType,
    pub prescription_label: String,
    pub manufacturer: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

// Cart DTOs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub medicine_id: i64,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: i32,
    pub total: Decimal,
    pub total_display: String,
    pub is_guest: bool,
    pub messages: Vec<FlashMessage>,
}

// Checkout and order DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutForm {
    #[validate(length(min = 1, max = 2000))]
    pub shipping_address: String,

    #[validate(length(min = 5, max = 15))]
    pub phone_number: String,

    #[validate(length(max = 100))]
    pub customer_name: Option<String>,

    #[validate(custom = "validate_optional_email")]
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOrderForm {
    #[serde(default)]
    pub order_id: String,

    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub is_guest: bool,
    pub total_amount: Decimal,
    pub total_display: String,
    pub status: OrderStatus,
    pub status_label: String,
    pub shipping_address: String,
    pub phone_number: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSearchType {
    Phone,
    Specific,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackOrderResponse {
    pub search_type: Option<TrackSearchType>,
    pub orders: Vec<OrderResponse>,
    pub order: Option<OrderResponse>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub medicine_id: i64,

    #[validate(range(min = 1))]
    pub quantity: i32,

    #[validate(custom = "validate_money")]
    pub price: Decimal,
}

/// Back-office order create/edit payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminOrderRequest {
    pub user_id: Option<Uuid>,

    pub status: OrderStatus,

    #[validate(length(min = 1, max = 15))]
    pub phone_number: String,

    #[validate(custom = "validate_money")]
    pub total_amount: Decimal,

    #[validate(length(min = 1))]
    pub shipping_address: String,

    #[validate]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkStatusRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<i64>,

    pub status: String,
}

// Feedback DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeedbackForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: i32,

    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Approve,
    Unapprove,
    Feature,
    Unfeature,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    #[default]
    Customer,
    Product,
}

// Contact DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 3, max = 200))]
    pub subject: String,

    #[validate(length(min = 10, max = 5000))]
    pub message: String,
}

// Media DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MediaVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub video_type: VideoType,

    pub video_file: Option<String>,

    #[validate(url)]
    pub video_url: Option<String>,

    pub thumbnail: Option<String>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaVideoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub video_type: VideoType,
    pub video_type_label: String,
    pub video_file: Option<String>,
    pub video_url: Option<String>,
    pub embed_url: Option<String>,
    pub thumbnail: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

// Site settings DTOs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettingsForm {
    #[serde(default)]
    pub facebook_url: String,
    #[serde(default)]
    pub instagram_url: String,
    #[serde(default)]
    pub youtube_url: String,
    #[serde(default)]
    pub twitter_url: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub whatsapp_number: String,
    #[serde(default)]
    pub website_url: String,
}

// Storefront flash messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: MessageLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            message: message.into(),
        }
    }
}

// Pagination DTOs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
