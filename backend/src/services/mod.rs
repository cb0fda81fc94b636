pub mod cart_service;
pub mod catalog_service;
pub mod contact_service;
pub mod dashboard_service;
pub mod feedback_service;
pub mod media_service;
pub mod order_service;
pub mod session_service;
pub mod settings_service;

pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use contact_service::ContactService;
pub use dashboard_service::DashboardService;
pub use feedback_service::FeedbackService;
pub use media_service::MediaService;
pub use order_service::OrderService;
pub use session_service::{Session, SessionService};
pub use settings_service::SettingsService;

use actix_web::web;
use sqlx::PgPool;
use std::time::Duration;

/// Every service the HTTP layer needs, built over one pool
#[derive(Clone)]
pub struct Services {
    pub cart: CartService,
    pub catalog: CatalogService,
    pub contact: ContactService,
    pub dashboard: DashboardService,
    pub feedback: FeedbackService,
    pub media: MediaService,
    pub order: OrderService,
    pub session: SessionService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(db_pool: PgPool, session_ttl: Duration, secure_cookies: bool) -> Self {
        Self {
            cart: CartService::new(db_pool.clone()),
            catalog: CatalogService::new(db_pool.clone()),
            contact: ContactService::new(db_pool.clone()),
            dashboard: DashboardService::new(db_pool.clone()),
            feedback: FeedbackService::new(db_pool.clone()),
            media: MediaService::new(db_pool.clone()),
            order: OrderService::new(db_pool.clone()),
            session: SessionService::new(db_pool.clone(), session_ttl, secure_cookies),
            settings: SettingsService::new(db_pool),
        }
    }

    /// Expose each service as `web::Data<_>`
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.cart.clone()))
            .app_data(web::Data::new(self.catalog.clone()))
            .app_data(web::Data::new(self.contact.clone()))
            .app_data(web::Data::new(self.dashboard.clone()))
            .app_data(web::Data::new(self.feedback.clone()))
            .app_data(web::Data::new(self.media.clone()))
            .app_data(web::Data::new(self.order.clone()))
            .app_data(web::Data::new(self.session.clone()))
            .app_data(web::Data::new(self.settings.clone()));
    }
}
