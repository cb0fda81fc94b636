use pharmacy_shared::{
    AdminOrderRequest, CheckoutForm, OrderResponse, OrderStatus, PaginatedResponse, TrackOrderForm,
    TrackOrderResponse, TrackSearchType, MSG_CART_EMPTY, MSG_NO_ORDERS_FOR_PHONE, MSG_ORDER_NOT_FOUND,
    MSG_PHONE_REQUIRED, MSG_PHONE_REQUIRED_FOR_ORDER, DEFAULT_PAGE_SIZE,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Actor;
use crate::models::cart::{Cart, CartItem};
use crate::models::medicine::Medicine;
use crate::models::order::{DateWindow, NewOrder, NewOrderItem, Order, OrderFilter, OrderItem};
use crate::models::page_window;
use crate::models::session::SessionRecord;
use crate::services::cart_service::{guest_medicine_ids, member_lines, resolve_guest_lines, CartSummary};
use crate::services::session_service::{Session, SessionService};

/// Back-office order listing query; unknown status or date values are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub date: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
}

impl OrderListParams {
    pub fn to_filter(&self, now: DateTime<Utc>) -> (OrderFilter, i64) {
        let (page, limit, offset) = page_window(self.page, DEFAULT_PAGE_SIZE);
        let filter = OrderFilter {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            created_since: self
                .date
                .as_deref()
                .and_then(DateWindow::parse)
                .map(|window| window.since(now)),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            limit,
            offset,
        };
        (filter, page)
    }
}

/// An order ready to be written: header fields plus one item per cart line
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: NewOrder,
    pub items: Vec<NewOrderItem>,
}

impl OrderDraft {
    /// Build the order from a resolved cart. Guest contact details are folded
    /// into the stored address as "name\nemail\naddress".
    pub fn from_cart(actor: Actor, form: &CheckoutForm, cart: &CartSummary) -> Result<Self, AppError> {
        if cart.is_empty() {
            return Err(AppError::Validation(MSG_CART_EMPTY.to_string()));
        }

        let address = form.shipping_address.trim();
        let shipping_address = match actor {
            Actor::Member(_) => address.to_string(),
            Actor::Guest => format!(
                "{}\n{}\n{}",
                form.customer_name.as_deref().unwrap_or_default().trim(),
                form.customer_email.as_deref().unwrap_or_default().trim(),
                address
            ),
        };

        let items = cart
            .lines
            .iter()
            .map(|line| NewOrderItem {
                medicine_id: line.medicine_id,
                quantity: line.quantity,
                price: line.unit_price,
            })
            .collect();

        Ok(Self {
            order: NewOrder {
                user_id: actor.user_id(),
                total_amount: cart.total,
                status: OrderStatus::Pending,
                shipping_address,
                phone_number: form.phone_number.trim().to_string(),
            },
            items,
        })
    }
}

/// What a tracking form asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackQuery {
    ByPhone(String),
    ByOrder { order_id: String, phone_number: String },
}

impl TrackQuery {
    /// A phone number is always required
    pub fn from_form(form: &TrackOrderForm) -> Result<Self, AppError> {
        let order_id = form.order_id.trim();
        let phone_number = form.phone_number.trim();

        match (order_id.is_empty(), phone_number.is_empty()) {
            (true, false) => Ok(TrackQuery::ByPhone(phone_number.to_string())),
            (false, false) => Ok(TrackQuery::ByOrder {
                order_id: order_id.to_string(),
                phone_number: phone_number.to_string(),
            }),
            (false, true) => Err(AppError::field("phone_number", MSG_PHONE_REQUIRED_FOR_ORDER)),
            (true, true) => Err(AppError::field("phone_number", MSG_PHONE_REQUIRED)),
        }
    }
}

/// Group items by order id and render responses in the orders' order
fn with_items(orders: &[Order], items: Vec<OrderItem>) -> Vec<OrderResponse> {
    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    orders
        .iter()
        .map(|order| order.to_response(grouped.get(&order.id).map(Vec::as_slice).unwrap_or_default()))
        .collect()
}

/// Check admin-submitted items and compute what they add up to
fn validate_admin_items(request: &AdminOrderRequest) -> Result<Vec<NewOrderItem>, AppError> {
    if request.items.is_empty() {
        return Err(AppError::field("items", "At least one order item is required"));
    }
    Ok(request
        .items
        .iter()
        .map(|item| NewOrderItem {
            medicine_id: item.medicine_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect())
}

pub fn items_total(items: &[NewOrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: PgPool,
}

impl OrderService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Price the cart, write the order and its items, and clear the cart in one
    /// transaction. The cart (member cart row or guest session row) is locked
    /// before it is read, so a repeated submit waits for the first one and then
    /// finds nothing to order. Returns `None` when the locked cart is empty.
    pub async fn place_order(
        &self,
        actor: Actor,
        form: &CheckoutForm,
        session: &mut Session,
        sessions: &SessionService,
    ) -> Result<Option<Order>, AppError> {
        let mut tx = self.db_pool.begin().await?;

        let lines = match actor {
            Actor::Member(user_id) => match Cart::lock_for_user(&mut tx, user_id).await? {
                Some(_) => member_lines(CartItem::rows_for_user(&mut *tx, user_id).await?),
                None => Vec::new(),
            },
            Actor::Guest => match SessionRecord::lock(&mut tx, session.key()).await? {
                Some(record) => {
                    session.reload(record.data.0);
                    let ids = guest_medicine_ids(session.cart());
                    let medicines = Medicine::find_by_ids(&mut *tx, &ids).await?;
                    resolve_guest_lines(session.cart(), &medicines)
                }
                None => Vec::new(),
            },
        };

        let cart = CartSummary::from_lines(lines);
        if cart.is_empty() {
            tx.rollback().await?;
            info!("Checkout found an empty cart for {:?}", actor);
            return Ok(None);
        }
        let draft = OrderDraft::from_cart(actor, form, &cart)?;

        let order = Order::create(&mut tx, &draft.order).await?;
        OrderItem::insert_many(&mut tx, order.id, &draft.items).await?;

        match actor {
            Actor::Member(user_id) => {
                let cleared = CartItem::clear(&mut *tx, user_id).await?;
                tracing::debug!("Cleared {} cart line(s) for member {}", cleared, user_id);
            }
            Actor::Guest => {
                session.cart_mut().clear();
                sessions.save_in(&mut tx, session).await?;
            }
        }

        tx.commit().await?;

        info!(
            "Placed order {} ({} item(s), total {}) for {}",
            order.id,
            draft.items.len(),
            order.total_amount,
            if actor.is_guest() { "guest" } else { "member" }
        );
        Ok(Some(order))
    }

    pub async fn order_with_items(&self, order: &Order) -> Result<OrderResponse, AppError> {
        let items = OrderItem::for_order(&self.db_pool, order.id).await?;
        Ok(order.to_response(&items))
    }

    /// Order success page data
    pub async fn get_order(&self, order_id: i64) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.db_pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.order_with_items(&order).await
    }

    pub async fn track(&self, query: &TrackQuery) -> Result<TrackOrderResponse, AppError> {
        match query {
            TrackQuery::ByPhone(phone_number) => {
                let orders = Order::find_by_phone(&self.db_pool, phone_number).await?;
                let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
                let items = OrderItem::for_orders(&self.db_pool, &ids).await?;
                let error = orders.is_empty().then(|| MSG_NO_ORDERS_FOR_PHONE.to_string());
                Ok(TrackOrderResponse {
                    search_type: Some(TrackSearchType::Phone),
                    orders: with_items(&orders, items),
                    order: None,
                    error,
                })
            }
            TrackQuery::ByOrder { order_id, phone_number } => {
                let order = match order_id.trim_start_matches('#').parse::<i64>() {
                    Ok(id) => Order::find_by_id_and_phone(&self.db_pool, id, phone_number).await?,
                    Err(_) => None,
                };

                match order {
                    Some(order) => Ok(TrackOrderResponse {
                        search_type: Some(TrackSearchType::Specific),
                        orders: Vec::new(),
                        order: Some(self.order_with_items(&order).await?),
                        error: None,
                    }),
                    None => Ok(TrackOrderResponse {
                        search_type: None,
                        orders: Vec::new(),
                        order: None,
                        error: Some(MSG_ORDER_NOT_FOUND.to_string()),
                    }),
                }
            }
        }
    }

    pub async fn member_history(&self, user_id: Uuid) -> Result<Vec<OrderResponse>, AppError> {
        let orders = Order::find_by_user(&self.db_pool, user_id).await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = OrderItem::for_orders(&self.db_pool, &ids).await?;
        Ok(with_items(&orders, items))
    }

    pub async fn member_order(&self, user_id: Uuid, order_id: i64) -> Result<OrderResponse, AppError> {
        let order = Order::find_for_user(&self.db_pool, order_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.order_with_items(&order).await
    }

    // Back-office

    pub async fn search(&self, filter: &OrderFilter, page: i64) -> Result<PaginatedResponse<OrderResponse>, AppError> {
        let (orders, total) = Order::search(&self.db_pool, filter).await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = OrderItem::for_orders(&self.db_pool, &ids).await?;
        Ok(PaginatedResponse::new(with_items(&orders, items), total, page, filter.limit))
    }

    pub async fn update_status(&self, order_id: i64, status: &str) -> Result<OrderResponse, AppError> {
        let status: OrderStatus = status
            .parse()
            .map_err(|_| AppError::field("status", "Invalid status"))?;

        let order = Order::update_status(&self.db_pool, order_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        info!("Order {} status set to {}", order.id, status);
        self.order_with_items(&order).await
    }

    pub async fn bulk_update_status(&self, order_ids: &[i64], status: &str) -> Result<u64, AppError> {
        let status: OrderStatus = status
            .parse()
            .map_err(|_| AppError::field("status", "Invalid status"))?;

        let updated = Order::bulk_update_status(&self.db_pool, order_ids, status).await?;
        info!("Bulk status update to {}: {} order(s)", status, updated);
        Ok(updated)
    }

    async fn ensure_medicines_exist(&self, conn: &mut sqlx::PgConnection, items: &[NewOrderItem]) -> Result<(), AppError> {
        let ids: Vec<i64> = items.iter().map(|item| item.medicine_id).collect();
        let found = Medicine::find_by_ids(&mut *conn, &ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|m| m.id == **id)) {
            return Err(AppError::field("items", format!("Medicine {} does not exist", missing)));
        }
        Ok(())
    }

    /// Create an order with its items; nothing is written unless every item is valid
    pub async fn create_admin_order(&self, request: &AdminOrderRequest) -> Result<OrderResponse, AppError> {
        let items = validate_admin_items(request)?;
        let new_order = NewOrder {
            user_id: request.user_id,
            total_amount: request.total_amount,
            status: request.status,
            shipping_address: request.shipping_address.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
        };

        let mut tx = self.db_pool.begin().await?;
        self.ensure_medicines_exist(&mut tx, &items).await?;
        let order = Order::create(&mut tx, &new_order).await?;
        OrderItem::insert_many(&mut tx, order.id, &items).await?;
        tx.commit().await?;

        if new_order.total_amount != items_total(&items) {
            warn!(
                "Order {} saved with total {} but items add up to {}",
                order.id,
                new_order.total_amount,
                items_total(&items)
            );
        }

        info!("Created order {} from back-office", order.id);
        self.order_with_items(&order).await
    }

    /// Update the order and replace all of its items in one transaction
    pub async fn update_admin_order(&self, order_id: i64, request: &AdminOrderRequest) -> Result<OrderResponse, AppError> {
        let items = validate_admin_items(request)?;
        let new_order = NewOrder {
            user_id: request.user_id,
            total_amount: request.total_amount,
            status: request.status,
            shipping_address: request.shipping_address.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
        };

        let mut tx = self.db_pool.begin().await?;
        let order = Order::update_details(&mut tx, order_id, &new_order)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        self.ensure_medicines_exist(&mut tx, &items).await?;
        OrderItem::delete_for_order(&mut tx, order.id).await?;
        OrderItem::insert_many(&mut tx, order.id, &items).await?;
        tx.commit().await?;

        info!("Updated order {} with {} item(s)", order.id, items.len());
        self.order_with_items(&order).await
    }

    pub async fn delete(&self, order_id: i64) -> Result<(), AppError> {
        if !Order::delete(&self.db_pool, order_id).await? {
            return Err(AppError::NotFound("Order not found".to_string()));
        }
        info!("Deleted order {}", order_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cart_service::CartLine;

    fn form() -> CheckoutForm {
        CheckoutForm {
            shipping_address: " 12 MG Road, Bengaluru ".to_string(),
            phone_number: "9876543210".to_string(),
            customer_name: Some("Asha".to_string()),
            customer_email: Some("asha@example.com".to_string()),
        }
    }

    fn cart() -> CartSummary {
        CartSummary::from_lines(vec![
            CartLine {
                medicine_id: 1,
                name: "A".to_string(),
                image: String::new(),
                unit_price: Decimal::new(9000, 2),
                quantity: 2,
            },
            CartLine {
                medicine_id: 2,
                name: "B".to_string(),
                image: String::new(),
                unit_price: Decimal::new(5000, 2),
                quantity: 1,
            },
        ])
    }

    #[test]
    fn draft_snapshots_live_prices() {
        let user_id = Uuid::new_v4();
        let draft = OrderDraft::from_cart(Actor::Member(user_id), &form(), &cart()).unwrap();

        assert_eq!(draft.order.total_amount, Decimal::new(23000, 2));
        assert_eq!(draft.order.status, OrderStatus::Pending);
        assert_eq!(draft.order.user_id, Some(user_id));
        assert_eq!(draft.order.shipping_address, "12 MG Road, Bengaluru");
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].price, Decimal::new(9000, 2));
        assert_eq!(draft.items[1].price, Decimal::new(5000, 2));
        assert_eq!(items_total(&draft.items), draft.order.total_amount);
    }

    #[test]
    fn guest_draft_folds_contact_into_address() {
        let draft = OrderDraft::from_cart(Actor::Guest, &form(), &cart()).unwrap();
        assert_eq!(draft.order.user_id, None);
        assert_eq!(
            draft.order.shipping_address,
            "Asha\nasha@example.com\n12 MG Road, Bengaluru"
        );
    }

    #[test]
    fn empty_cart_cannot_be_drafted() {
        let err = OrderDraft::from_cart(Actor::Guest, &form(), &CartSummary::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == MSG_CART_EMPTY));
    }

    #[test]
    fn tracking_requires_a_phone_number() {
        let query = TrackQuery::from_form(&TrackOrderForm {
            order_id: String::new(),
            phone_number: " 9876543210 ".to_string(),
        })
        .unwrap();
        assert_eq!(query, TrackQuery::ByPhone("9876543210".to_string()));

        let query = TrackQuery::from_form(&TrackOrderForm {
            order_id: "17".to_string(),
            phone_number: "9876543210".to_string(),
        })
        .unwrap();
        assert!(matches!(query, TrackQuery::ByOrder { .. }));

        let err = TrackQuery::from_form(&TrackOrderForm {
            order_id: "17".to_string(),
            phone_number: String::new(),
        })
        .unwrap_err();
        match err {
            AppError::InvalidForm(fields) => {
                assert_eq!(fields["phone_number"], vec![MSG_PHONE_REQUIRED_FOR_ORDER.to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(TrackQuery::from_form(&TrackOrderForm {
            order_id: String::new(),
            phone_number: "  ".to_string(),
        })
        .is_err());
    }

    #[test]
    fn order_list_params_build_a_filter() {
        let now = Utc::now();
        let params = OrderListParams {
            status: Some("shipped".to_string()),
            date: Some("week".to_string()),
            search: Some("  ".to_string()),
            page: Some(2),
        };
        let (filter, page) = params.to_filter(now);

        assert_eq!(page, 2);
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.created_since, Some(now - chrono::Duration::days(7)));
        assert_eq!(filter.search, None);
        assert_eq!(filter.offset, DEFAULT_PAGE_SIZE);

        let (filter, _) = OrderListParams {
            status: Some("LOST".to_string()),
            date: Some("decade".to_string()),
            ..OrderListParams::default()
        }
        .to_filter(now);
        assert_eq!(filter.status, None);
        assert_eq!(filter.created_since, None);
    }
}
