use actix_web::{web, HttpRequest, HttpResponse};
use pharmacy_shared::{FlashMessage, MAX_LINE_QUANTITY, MSG_ITEM_REMOVED};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::{json_with_session, see_other};
use crate::middleware::Actor;
use crate::services::{CartService, SessionService};

const CART_PATH: &str = "/cart/";

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: Option<String>,
}

impl QuantityForm {
    /// Missing quantity means 1; anything else must be a whole number
    /// no larger than `MAX_LINE_QUANTITY`
    pub fn quantity(&self) -> Result<i32, AppError> {
        let quantity = match self.quantity.as_deref().map(str::trim) {
            None | Some("") => return Ok(1),
            Some(value) => value
                .parse::<i32>()
                .map_err(|_| AppError::field("quantity", "Enter a whole number."))?,
        };
        if quantity > MAX_LINE_QUANTITY {
            return Err(AppError::field(
                "quantity",
                format!("Ensure this value is less than or equal to {}.", MAX_LINE_QUANTITY),
            ));
        }
        Ok(quantity)
    }
}

pub async fn cart_detail(
    req: HttpRequest,
    actor: Actor,
    cart_service: web::Data<CartService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let summary = cart_service.summary(actor, &mut session).await?;
    let view = summary.to_view(actor.is_guest(), session.take_messages());
    json_with_session(&session_service, &session, &view).await
}

pub async fn add_to_cart(
    req: HttpRequest,
    actor: Actor,
    path: web::Path<i64>,
    cart_service: web::Data<CartService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let medicine = cart_service.add(actor, &mut session, path.into_inner()).await?;

    session.flash(FlashMessage::success(format!("{} added to cart!", medicine.name)));
    see_other(&session_service, &session, CART_PATH).await
}

pub async fn update_cart_item(
    req: HttpRequest,
    actor: Actor,
    path: web::Path<i64>,
    form: web::Form<QuantityForm>,
    cart_service: web::Data<CartService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let quantity = form.quantity()?;

    let mut session = session_service.load(&req).await?;
    cart_service
        .update(actor, &mut session, path.into_inner(), quantity)
        .await?;
    see_other(&session_service, &session, CART_PATH).await
}

pub async fn remove_from_cart(
    req: HttpRequest,
    actor: Actor,
    path: web::Path<i64>,
    cart_service: web::Data<CartService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    cart_service.remove(actor, &mut session, path.into_inner()).await?;

    session.flash(FlashMessage::success(MSG_ITEM_REMOVED));
    see_other(&session_service, &session, CART_PATH).await
}
