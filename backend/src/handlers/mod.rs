pub mod admin;
pub mod cart;
pub mod catalog;
pub mod content;
pub mod health;
pub mod orders;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use pharmacy_shared::{FlashMessage, UserRole};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::AuthMiddleware;
use crate::services::{Session, SessionService};
use crate::utils::jwt::JwtService;

/// Read-model wrapper that carries the flash messages popped for this request
#[derive(Debug, Serialize)]
pub struct Page<T> {
    #[serde(flatten)]
    pub data: T,
    pub messages: Vec<FlashMessage>,
}

/// Save the session and answer with a 303 redirect, setting the cookie when needed
pub async fn see_other(
    sessions: &SessionService,
    session: &Session,
    location: &str,
) -> Result<HttpResponse, AppError> {
    sessions.save(session).await?;

    let mut response = HttpResponse::SeeOther();
    response.insert_header((header::LOCATION, location.to_string()));
    if let Some(cookie) = sessions.cookie_for(session) {
        response.cookie(cookie);
    }
    Ok(response.finish())
}

/// Save the session and answer with a JSON body
pub async fn json_with_session<T: Serialize>(
    sessions: &SessionService,
    session: &Session,
    body: &T,
) -> Result<HttpResponse, AppError> {
    sessions.save(session).await?;

    let mut response = HttpResponse::Ok();
    if let Some(cookie) = sessions.cookie_for(session) {
        response.cookie(cookie);
    }
    Ok(response.json(body))
}

/// Pop pending messages and render `data` as a page
pub async fn page<T: Serialize>(
    sessions: &SessionService,
    session: &mut Session,
    data: T,
) -> Result<HttpResponse, AppError> {
    let page = Page {
        data,
        messages: session.take_messages(),
    };
    json_with_session(sessions, session, &page).await
}

/// Same-site Referer path, else `fallback`
pub fn back_to(req: &HttpRequest, fallback: &str) -> String {
    req.headers()
        .get(header::REFERER)
        .and_then(|h| h.to_str().ok())
        .and_then(|referer| {
            let host = req.connection_info().host().to_string();
            let rest = referer
                .strip_prefix("http://")
                .or_else(|| referer.strip_prefix("https://"))?;
            let path = rest.strip_prefix(host.as_str())?;
            path.starts_with('/').then(|| path.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// Register storefront routes and the staff-only `/admin` scope
pub fn configure(cfg: &mut web::ServiceConfig, jwt_service: JwtService) {
    cfg.route("/health", web::get().to(health::health_check))
        // Catalog
        .route("/", web::get().to(catalog::home))
        .route("/medicines/", web::get().to(catalog::medicine_list))
        .route("/search/", web::get().to(catalog::search))
        .route("/api/search-suggestions/", web::get().to(catalog::search_suggestions))
        .route("/medicine/{id}/", web::get().to(catalog::medicine_detail))
        // Cart
        .route("/cart/", web::get().to(cart::cart_detail))
        .route("/add-to-cart/{medicine_id}/", web::post().to(cart::add_to_cart))
        .route("/update-cart/{medicine_id}/", web::post().to(cart::update_cart_item))
        .route("/remove-from-cart/{medicine_id}/", web::post().to(cart::remove_from_cart))
        // Checkout and orders
        .route("/checkout/", web::get().to(orders::checkout_page))
        .route("/checkout/", web::post().to(orders::checkout))
        .route("/order-success/{order_id}/", web::get().to(orders::order_success))
        .route("/track-order/", web::post().to(orders::track_order))
        .route("/orders/", web::get().to(orders::order_history))
        .route("/order/{order_id}/", web::get().to(orders::order_detail))
        // Feedback, contact, media, settings
        .route("/submit-feedback/", web::post().to(content::submit_feedback))
        .route("/submit-product-feedback/{medicine_id}/", web::post().to(content::submit_product_feedback))
        .route("/contact-us/", web::post().to(content::contact_us))
        .route("/media/", web::get().to(content::media_page))
        .route("/site-settings/", web::get().to(content::site_settings))
        .service(
            web::scope("/admin")
                .wrap(AuthMiddleware::new(jwt_service).require_role(UserRole::Staff))
                .configure(admin::configure),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use uuid::Uuid;

    fn jwt() -> JwtService {
        JwtService::new("handler-test-secret-0123456789abcdef").expect("jwt service")
    }

    #[actix_web::test]
    async fn admin_scope_requires_staff() {
        let jwt = jwt();
        let app = test::init_service(App::new().configure(|cfg| configure(cfg, jwt.clone()))).await;

        let req = test::TestRequest::get().uri("/admin/dashboard").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = jwt
            .generate_access_token(Uuid::new_v4(), UserRole::Customer, chrono::Duration::minutes(5))
            .expect("token");
        let req = test::TestRequest::get()
            .uri("/admin/dashboard")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn back_to_keeps_same_host_paths_only() {
        let req = test::TestRequest::default()
            .insert_header((header::HOST, "shop.test"))
            .insert_header((header::REFERER, "http://shop.test/medicine/4/"))
            .to_http_request();
        assert_eq!(back_to(&req, "/"), "/medicine/4/");

        let req = test::TestRequest::default()
            .insert_header((header::HOST, "shop.test"))
            .insert_header((header::REFERER, "https://elsewhere.test/phish/"))
            .to_http_request();
        assert_eq!(back_to(&req, "/"), "/");
    }
}
