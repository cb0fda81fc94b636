//! Shared setup for the database integration tests.
//!
//! Tests run against `TEST_DATABASE_URL` and are skipped when it is unset.
//! Every test creates its own category, medicines and phone numbers, so
//! tests can share one database and run concurrently.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use pharmacy_backend::models::{Category, Medicine};
use pharmacy_backend::utils::jwt::JwtService;
use pharmacy_shared::{CategoryRequest, MedicineRequest, PrescriptionType, UserRole, SESSION_COOKIE_NAME};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub async fn test_pool() -> Option<PgPool> {
    let url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

pub fn jwt() -> JwtService {
    JwtService::new(JWT_SECRET).expect("jwt service")
}

pub fn bearer(user_id: Uuid, role: UserRole) -> String {
    let token = jwt()
        .generate_access_token(user_id, role, chrono::Duration::minutes(5))
        .expect("token");
    format!("Bearer {}", token)
}

/// Ten-digit phone number unique to the calling test
pub fn unique_phone() -> String {
    format!("9{:09}", Uuid::new_v4().as_u128() % 1_000_000_000)
}

pub async fn create_category(pool: &PgPool) -> Category {
    Category::create(
        pool,
        &CategoryRequest {
            name: format!("Test category {}", Uuid::new_v4()),
            description: String::new(),
            image: None,
        },
    )
    .await
    .expect("create category")
}

pub async fn create_medicine(pool: &PgPool, category: &Category, name: &str, price: Decimal) -> Medicine {
    Medicine::create(
        pool,
        &MedicineRequest {
            name: format!("{} {}", name, Uuid::new_v4()),
            category_id: category.id,
            description: String::new(),
            mrp: price,
            price,
            stock_quantity: 25,
            prescription_type: PrescriptionType::Otc,
            manufacturer: Some("Test Labs".to_string()),
            expiry_date: None,
            image: None,
            is_active: true,
        },
    )
    .await
    .expect("create medicine")
}

pub fn session_cookie(resp: &ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.into_owned())
}

pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn orders_for_phone(pool: &PgPool, phone_number: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE phone_number = $1")
        .bind(phone_number)
        .fetch_one(pool)
        .await
        .expect("count orders")
}
