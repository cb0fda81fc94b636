use actix_web::{web, HttpRequest, HttpResponse};
use pharmacy_shared::{CheckoutForm, FlashMessage, TrackOrderForm, MSG_CART_EMPTY};
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::{json_with_session, page, see_other};
use crate::middleware::Actor;
use crate::services::order_service::TrackQuery;
use crate::services::{CartService, OrderService, SessionService};

const CART_PATH: &str = "/cart/";

#[derive(Debug, Serialize)]
struct OrderPage<T> {
    order: T,
}

fn member_only(actor: Actor) -> Result<uuid::Uuid, AppError> {
    actor
        .user_id()
        .ok_or_else(|| AppError::Authentication("Please sign in to view your orders".to_string()))
}

pub async fn checkout_page(
    req: HttpRequest,
    actor: Actor,
    cart_service: web::Data<CartService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let summary = cart_service.summary(actor, &mut session).await?;

    if summary.is_empty() {
        session.flash(FlashMessage::error(MSG_CART_EMPTY));
        return see_other(&session_service, &session, CART_PATH).await;
    }

    let view = summary.to_view(actor.is_guest(), session.take_messages());
    json_with_session(&session_service, &session, &view).await
}

/// Place the order for whatever the cart holds right now
pub async fn checkout(
    req: HttpRequest,
    actor: Actor,
    form: web::Form<CheckoutForm>,
    cart_service: web::Data<CartService>,
    order_service: web::Data<OrderService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let summary = cart_service.summary(actor, &mut session).await?;

    if summary.is_empty() {
        session.flash(FlashMessage::error(MSG_CART_EMPTY));
        return see_other(&session_service, &session, CART_PATH).await;
    }

    form.validate()?;
    let order = match order_service
        .place_order(actor, &form, &mut session, &session_service)
        .await?
    {
        Some(order) => order,
        None => {
            session.flash(FlashMessage::error(MSG_CART_EMPTY));
            return see_other(&session_service, &session, CART_PATH).await;
        }
    };

    session.flash(FlashMessage::success(format!(
        "Order #{} placed successfully! We will contact you soon.",
        order.id
    )));
    see_other(&session_service, &session, &format!("/order-success/{}/", order.id)).await
}

pub async fn order_success(
    req: HttpRequest,
    path: web::Path<i64>,
    order_service: web::Data<OrderService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let order = order_service.get_order(path.into_inner()).await?;
    page(&session_service, &mut session, OrderPage { order }).await
}

/// Guest lookup by phone, or by phone and order number
pub async fn track_order(
    form: web::Form<TrackOrderForm>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let query = TrackQuery::from_form(&form)?;
    let result = order_service.track(&query).await?;

    info!(
        "Order tracking lookup: {} order(s), specific match: {}",
        result.orders.len(),
        result.order.is_some()
    );
    Ok(HttpResponse::Ok().json(result))
}

pub async fn order_history(
    actor: Actor,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let user_id = member_only(actor)?;
    let orders = order_service.member_history(user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn order_detail(
    actor: Actor,
    path: web::Path<i64>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let user_id = member_only(actor)?;
    let order = order_service.member_order(user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderPage { order }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sqlx::postgres::PgPoolOptions;

    use crate::utils::jwt::JwtService;

    fn lazy_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pharmacy_unused")
            .expect("lazy pool")
    }

    #[actix_web::test]
    async fn tracking_without_phone_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(OrderService::new(lazy_pool())))
                .route("/track-order/", web::post().to(track_order)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/track-order/")
            .set_form([("order_id", "42"), ("phone_number", "")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["fields"]["phone_number"][0],
            "Please enter your phone number to track the order."
        );
    }

    #[actix_web::test]
    async fn guests_have_no_order_history() {
        let jwt = JwtService::new("history-test-secret-0123456789abcdef").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .app_data(web::Data::new(OrderService::new(lazy_pool())))
                .route("/orders/", web::get().to(order_history)),
        )
        .await;

        let req = test::TestRequest::get().uri("/orders/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
