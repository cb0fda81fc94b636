use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

use pharmacy_backend::handlers;
use pharmacy_backend::services::Services;
use pharmacy_backend::utils::jwt::JwtService;
use pharmacy_backend::{AppConfig, AppError, Database};

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600),
        None => Cors::default(),
    }
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Starting pharmacy backend on {}", config.bind_address());

    // Initialize database
    let database = Database::new(&config.database_url, config.max_db_connections).await?;
    database.migrate().await?;

    let jwt_service = JwtService::new(&config.jwt_secret)?;
    let services = Services::new(database.pool().clone(), config.session_ttl(), config.secure_cookies);

    match services.session.purge_expired().await {
        Ok(purged) => info!("Purged {} expired session(s)", purged),
        Err(e) => warn!("Could not purge expired sessions: {}", e),
    }

    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors(cors_origin.as_deref()))
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .configure(|cfg| services.register(cfg))
            .configure(|cfg| handlers::configure(cfg, jwt_service.clone()))
    })
    .bind(config.bind_address())?
    .run()
    .await
    .map_err(AppError::from)
}
