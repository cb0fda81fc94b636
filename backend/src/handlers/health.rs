use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::database::Database;

pub async fn health_check(database: web::Data<Database>) -> Result<HttpResponse> {
    let database_ok = database.ping().await;
    let body = json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "service": "pharmacy-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database_ok,
    });

    if database_ok {
        Ok(HttpResponse::Ok().json(body))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(body))
    }
}
