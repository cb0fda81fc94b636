//! Online pharmacy storefront and back-office API.

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use database::Database;
pub use error::AppError;
