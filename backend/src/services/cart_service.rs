use pharmacy_shared::{CartLineView, CartView, FlashMessage, MAX_LINE_QUANTITY};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Actor;
use crate::models::cart::{Cart, CartItem, CartItemRow};
use crate::models::medicine::Medicine;
use crate::models::session::GuestCartLine;
use crate::services::session_service::Session;
use crate::utils::currency::format_rupees_simple;

/// One resolved cart line, always priced at the medicine's current price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub medicine_id: i64,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Resolved cart contents and their total
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl CartSummary {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Self { lines, total }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn to_view(&self, is_guest: bool, messages: Vec<FlashMessage>) -> CartView {
        CartView {
            lines: self
                .lines
                .iter()
                .map(|line| CartLineView {
                    medicine_id: line.medicine_id,
                    name: line.name.clone(),
                    image: line.image.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total(),
                })
                .collect(),
            item_count: self.item_count(),
            total: self.total,
            total_display: format_rupees_simple(self.total),
            is_guest,
            messages,
        }
    }
}

/// Cart operations shared by member and guest carts
#[allow(async_fn_in_trait)]
pub trait CartStore {
    /// Add one unit of an active medicine
    async fn add(&mut self, medicine: &Medicine) -> Result<(), AppError>;

    /// Set an explicit quantity; zero or less removes the line
    async fn set_quantity(&mut self, medicine_id: i64, quantity: i32) -> Result<(), AppError>;

    /// Remove the line if present
    async fn remove(&mut self, medicine_id: i64) -> Result<(), AppError>;

    /// Lines priced from the catalog
    async fn lines(&self) -> Result<Vec<CartLine>, AppError>;
}

/// Database cart of a signed-in member
pub struct MemberCart<'a> {
    db_pool: &'a PgPool,
    user_id: Uuid,
}

impl<'a> MemberCart<'a> {
    pub fn new(db_pool: &'a PgPool, user_id: Uuid) -> Self {
        Self { db_pool, user_id }
    }
}

impl CartStore for MemberCart<'_> {
    async fn add(&mut self, medicine: &Medicine) -> Result<(), AppError> {
        let cart = Cart::get_or_create(self.db_pool, self.user_id).await?;
        let item = CartItem::add_one(self.db_pool, cart.id, medicine.id, MAX_LINE_QUANTITY).await?;
        debug!(
            "Member {} cart now has {} x medicine {}",
            self.user_id, item.quantity, medicine.id
        );
        Ok(())
    }

    async fn set_quantity(&mut self, medicine_id: i64, quantity: i32) -> Result<(), AppError> {
        if quantity <= 0 {
            return self.remove(medicine_id).await;
        }
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        if !CartItem::set_quantity(self.db_pool, self.user_id, medicine_id, quantity).await? {
            debug!("Member {} has no line for medicine {}", self.user_id, medicine_id);
        }
        Ok(())
    }

    async fn remove(&mut self, medicine_id: i64) -> Result<(), AppError> {
        if !CartItem::remove(self.db_pool, self.user_id, medicine_id).await? {
            debug!("Member {} has no line for medicine {}", self.user_id, medicine_id);
        }
        Ok(())
    }

    async fn lines(&self) -> Result<Vec<CartLine>, AppError> {
        let rows = CartItem::rows_for_user(self.db_pool, self.user_id).await?;
        Ok(member_lines(rows))
    }
}

/// Session cart of an anonymous visitor
pub struct GuestCart<'a> {
    db_pool: &'a PgPool,
    session: &'a mut Session,
}

impl<'a> GuestCart<'a> {
    pub fn new(db_pool: &'a PgPool, session: &'a mut Session) -> Self {
        Self { db_pool, session }
    }
}

impl CartStore for GuestCart<'_> {
    async fn add(&mut self, medicine: &Medicine) -> Result<(), AppError> {
        self.session
            .cart_mut()
            .entry(medicine.id.to_string())
            .and_modify(|line| line.quantity = line.quantity.saturating_add(1).min(MAX_LINE_QUANTITY))
            .or_insert_with(|| GuestCartLine {
                quantity: 1,
                name: medicine.name.clone(),
                price: medicine.price.to_string(),
                image: medicine.image_url(),
            });
        Ok(())
    }

    async fn set_quantity(&mut self, medicine_id: i64, quantity: i32) -> Result<(), AppError> {
        let key = medicine_id.to_string();
        if !self.session.cart().contains_key(&key) {
            return Ok(());
        }

        let cart = self.session.cart_mut();
        if quantity > 0 {
            if let Some(line) = cart.get_mut(&key) {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
            }
        } else {
            cart.remove(&key);
        }
        Ok(())
    }

    async fn remove(&mut self, medicine_id: i64) -> Result<(), AppError> {
        let key = medicine_id.to_string();
        if self.session.cart().contains_key(&key) {
            self.session.cart_mut().remove(&key);
        }
        Ok(())
    }

    async fn lines(&self) -> Result<Vec<CartLine>, AppError> {
        let ids = guest_medicine_ids(self.session.cart());
        let medicines = Medicine::find_by_ids(self.db_pool, &ids).await?;
        Ok(resolve_guest_lines(self.session.cart(), &medicines))
    }
}

pub fn member_lines(rows: Vec<CartItemRow>) -> Vec<CartLine> {
    rows.into_iter()
        .map(|row| CartLine {
            medicine_id: row.medicine_id,
            name: row.name,
            image: row.image.unwrap_or_default(),
            unit_price: row.price,
            quantity: row.quantity,
        })
        .collect()
}

/// Session cart keys that look like medicine ids
pub fn guest_medicine_ids(cart: &BTreeMap<String, GuestCartLine>) -> Vec<i64> {
    cart.keys().filter_map(|key| key.parse::<i64>().ok()).collect()
}

/// Price a session cart against current catalog rows.
/// Keys that are not ids, or ids with no medicine behind them, are skipped.
pub fn resolve_guest_lines(cart: &BTreeMap<String, GuestCartLine>, medicines: &[Medicine]) -> Vec<CartLine> {
    let by_id: HashMap<i64, &Medicine> = medicines.iter().map(|m| (m.id, m)).collect();

    cart.iter()
        .filter_map(|(key, line)| {
            let id = key.parse::<i64>().ok()?;
            let medicine = by_id.get(&id)?;
            Some(CartLine {
                medicine_id: id,
                name: medicine.name.clone(),
                image: medicine.image_url(),
                unit_price: medicine.price,
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Lines and total for any cart store
pub async fn resolve_cart<C: CartStore>(store: &C) -> Result<CartSummary, AppError> {
    Ok(CartSummary::from_lines(store.lines().await?))
}

/// Storefront cart use cases, dispatched on the actor
#[derive(Clone)]
pub struct CartService {
    db_pool: PgPool,
}

impl CartService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }

    async fn active_medicine(&self, medicine_id: i64) -> Result<Medicine, AppError> {
        Medicine::find_active_by_id(&self.db_pool, medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))
    }

    /// Returns the medicine that was added so callers can name it
    pub async fn add(&self, actor: Actor, session: &mut Session, medicine_id: i64) -> Result<Medicine, AppError> {
        let medicine = self.active_medicine(medicine_id).await?;
        match actor {
            Actor::Member(user_id) => MemberCart::new(&self.db_pool, user_id).add(&medicine).await?,
            Actor::Guest => GuestCart::new(&self.db_pool, session).add(&medicine).await?,
        }
        info!("Added medicine {} to {:?} cart", medicine.id, actor);
        Ok(medicine)
    }

    pub async fn update(&self, actor: Actor, session: &mut Session, medicine_id: i64, quantity: i32) -> Result<(), AppError> {
        match actor {
            Actor::Member(user_id) => {
                MemberCart::new(&self.db_pool, user_id)
                    .set_quantity(medicine_id, quantity)
                    .await
            }
            Actor::Guest => {
                GuestCart::new(&self.db_pool, session)
                    .set_quantity(medicine_id, quantity)
                    .await
            }
        }
    }

    pub async fn remove(&self, actor: Actor, session: &mut Session, medicine_id: i64) -> Result<(), AppError> {
        match actor {
            Actor::Member(user_id) => MemberCart::new(&self.db_pool, user_id).remove(medicine_id).await,
            Actor::Guest => GuestCart::new(&self.db_pool, session).remove(medicine_id).await,
        }
    }

    pub async fn summary(&self, actor: Actor, session: &mut Session) -> Result<CartSummary, AppError> {
        match actor {
            Actor::Member(user_id) => resolve_cart(&MemberCart::new(&self.db_pool, user_id)).await,
            Actor::Guest => resolve_cart(&GuestCart::new(&self.db_pool, session)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::medicine::tests::medicine;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    fn line(id: i64, price: Decimal, quantity: i32) -> CartLine {
        CartLine {
            medicine_id: id,
            name: format!("Medicine {}", id),
            image: String::new(),
            unit_price: price,
            quantity,
        }
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let summary = CartSummary::from_lines(vec![
            line(1, Decimal::new(9000, 2), 2),
            line(2, Decimal::new(5000, 2), 1),
        ]);
        assert_eq!(summary.total, Decimal::new(23000, 2));
        assert_eq!(summary.item_count(), 3);

        let view = summary.to_view(true, Vec::new());
        assert_eq!(view.total_display, "₹230.00");
        assert_eq!(view.lines[0].line_total, Decimal::new(18000, 2));
    }

    #[test]
    fn empty_cart_totals_zero() {
        let summary = CartSummary::from_lines(Vec::new());
        assert!(summary.is_empty());
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn guest_lines_use_live_price_and_skip_missing() {
        let mut cart = BTreeMap::new();
        for (key, price) in [("1", "80.00"), ("2", "50.00"), ("99", "10.00"), ("abc", "1.00")] {
            cart.insert(
                key.to_string(),
                GuestCartLine {
                    quantity: 2,
                    name: "stale".to_string(),
                    price: price.to_string(),
                    image: String::new(),
                },
            );
        }
        let medicines = vec![
            medicine(1, "Paracetamol", Decimal::new(9000, 2)),
            medicine(2, "Cetirizine", Decimal::new(5000, 2)),
        ];

        let lines = resolve_guest_lines(&cart, &medicines);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, Decimal::new(9000, 2));
        assert_eq!(lines[0].name, "Paracetamol");
        assert_eq!(CartSummary::from_lines(lines).total, Decimal::new(28000, 2));
    }

    #[test]
    fn guest_add_increments_and_update_removes() {
        tokio_test::block_on(async {
            let pool = lazy_pool();
            let mut session = Session::new();
            let paracetamol = medicine(1, "Paracetamol", Decimal::new(9000, 2));

            {
                let mut cart = GuestCart::new(&pool, &mut session);
                for _ in 0..3 {
                    cart.add(&paracetamol).await.unwrap();
                }
            }
            assert_eq!(session.cart()["1"].quantity, 3);
            assert_eq!(session.cart()["1"].price, "90.00");

            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.set_quantity(1, 5).await.unwrap();
            }
            assert_eq!(session.cart()["1"].quantity, 5);

            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.set_quantity(1, -1).await.unwrap();
            }
            assert!(session.cart().is_empty());
        });
    }

    #[test]
    fn guest_quantity_stops_at_the_line_limit() {
        tokio_test::block_on(async {
            let pool = lazy_pool();
            let mut session = Session::new();
            let paracetamol = medicine(1, "Paracetamol", Decimal::new(9000, 2));

            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.add(&paracetamol).await.unwrap();
                cart.set_quantity(1, i32::MAX).await.unwrap();
            }
            assert_eq!(session.cart()["1"].quantity, MAX_LINE_QUANTITY);

            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.add(&paracetamol).await.unwrap();
            }
            assert_eq!(session.cart()["1"].quantity, MAX_LINE_QUANTITY);

            // Sessions written before the limit existed
            session.cart_mut().get_mut("1").unwrap().quantity = i32::MAX;
            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.add(&paracetamol).await.unwrap();
            }
            assert_eq!(session.cart()["1"].quantity, MAX_LINE_QUANTITY);
        });
    }

    #[test]
    fn guest_remove_is_a_noop_when_absent() {
        tokio_test::block_on(async {
            let pool = lazy_pool();
            let mut session = Session::new();
            {
                let mut cart = GuestCart::new(&pool, &mut session);
                cart.remove(42).await.unwrap();
                cart.set_quantity(42, 3).await.unwrap();
            }
            assert!(session.cart().is_empty());
            assert!(!session.is_modified());
        });
    }
}
