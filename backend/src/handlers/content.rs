use actix_web::{web, HttpRequest, HttpResponse};
use pharmacy_shared::{ContactForm, FeedbackForm, FlashMessage, MSG_CONTACT_THANKS, MSG_FEEDBACK_THANKS};

use crate::error::AppError;
use crate::handlers::{back_to, page, see_other};
use crate::services::{ContactService, FeedbackService, MediaService, SessionService, SettingsService};

pub async fn submit_feedback(
    req: HttpRequest,
    form: web::Form<FeedbackForm>,
    feedback_service: web::Data<FeedbackService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    feedback_service.submit_customer(&form).await?;

    let mut session = session_service.load(&req).await?;
    session.flash(FlashMessage::success(MSG_FEEDBACK_THANKS));
    see_other(&session_service, &session, &back_to(&req, "/")).await
}

pub async fn submit_product_feedback(
    req: HttpRequest,
    path: web::Path<i64>,
    form: web::Form<FeedbackForm>,
    feedback_service: web::Data<FeedbackService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let medicine_id = path.into_inner();
    let medicine = feedback_service.submit_product(medicine_id, &form).await?;

    let mut session = session_service.load(&req).await?;
    session.flash(FlashMessage::success(format!(
        "Thank you for reviewing {}! 🙏",
        medicine.name
    )));
    see_other(&session_service, &session, &format!("/medicine/{}/", medicine_id)).await
}

pub async fn contact_us(
    req: HttpRequest,
    form: web::Form<ContactForm>,
    contact_service: web::Data<ContactService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let ip_address = req.peer_addr().map(|addr| addr.ip().to_string());
    contact_service.submit(&form, ip_address.as_deref()).await?;

    let mut session = session_service.load(&req).await?;
    session.flash(FlashMessage::success(MSG_CONTACT_THANKS));
    see_other(&session_service, &session, &back_to(&req, "/")).await
}

pub async fn media_page(
    req: HttpRequest,
    media_service: web::Data<MediaService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let gallery = media_service.gallery().await?;
    page(&session_service, &mut session, gallery).await
}

/// Social links and the wa.me number used by every storefront page
pub async fn site_settings(settings_service: web::Data<SettingsService>) -> Result<HttpResponse, AppError> {
    let settings = settings_service.public().await?;
    Ok(HttpResponse::Ok().json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    #[actix_web::test]
    async fn feedback_without_name_is_rejected_before_any_write() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pharmacy_unused")
            .expect("lazy pool");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(FeedbackService::new(pool.clone())))
                .app_data(web::Data::new(SessionService::new(pool, Duration::from_secs(60), false)))
                .route("/submit-feedback/", web::post().to(submit_feedback)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/submit-feedback/")
            .set_form([("name", "  "), ("email", ""), ("rating", "5"), ("feedback", "Great")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["fields"]["name"].is_array());
    }
}
