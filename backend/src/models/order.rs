use chrono::{DateTime, Duration, Utc};
use pharmacy_shared::{OrderItemResponse, OrderResponse, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::currency::format_rupees_simple;

const ORDER_COLUMNS: &str =
    "id, user_id, total_amount, status, shipping_address, phone_number, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Fields of a new order row
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub medicine_id: i64,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Week,
    Month,
}

impl DateWindow {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "today" => Some(DateWindow::Today),
            "week" => Some(DateWindow::Week),
            "month" => Some(DateWindow::Month),
            _ => None,
        }
    }

    /// Earliest creation time that falls inside the window
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateWindow::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
            DateWindow::Week => now - Duration::days(7),
            DateWindow::Month => now - Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub created_since: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl OrderFilter {
    fn push_conditions<'a>(&'a self, builder: &mut QueryBuilder<'a, Postgres>) {
        builder.push(" WHERE 1=1");

        if let Some(status) = self.status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }

        if let Some(since) = self.created_since {
            builder.push(" AND created_at >= ");
            builder.push_bind(since);
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            builder.push(" AND (phone_number ILIKE ");
            builder.push_bind(format!("%{}%", search));
            if let Ok(id) = search.trim_start_matches('#').parse::<i64>() {
                builder.push(" OR id = ");
                builder.push_bind(id);
            }
            builder.push(")");
        }
    }
}

impl Order {
    pub async fn create(conn: &mut PgConnection, order: &NewOrder) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO orders (user_id, total_amount, status, shipping_address, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.user_id)
            .bind(order.total_amount)
            .bind(order.status)
            .bind(&order.shipping_address)
            .bind(&order.phone_number)
            .fetch_one(conn)
            .await?;

        Ok(created)
    }

    pub async fn update_details(conn: &mut PgConnection, id: i64, order: &NewOrder) -> Result<Option<Self>, AppError> {
        let sql = format!(
            r#"
            UPDATE orders SET user_id = $1, total_amount = $2, status = $3,
                shipping_address = $4, phone_number = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(order.user_id)
            .bind(order.total_amount)
            .bind(order.status)
            .bind(&order.shipping_address)
            .bind(&order.phone_number)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(updated)
    }

    pub async fn find_by_id(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn find_by_id_and_phone(pool: &PgPool, id: i64, phone_number: &str) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1 AND phone_number = $2", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(phone_number)
            .fetch_optional(pool)
            .await?;

        Ok(order)
    }

    pub async fn find_by_phone(pool: &PgPool, phone_number: &str) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE phone_number = $1 ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(phone_number)
            .fetch_all(pool)
            .await?;

        Ok(orders)
    }

    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            ORDER_COLUMNS
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(orders)
    }

    pub async fn find_for_user(pool: &PgPool, id: i64, user_id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1 AND user_id = $2", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(order)
    }

    pub async fn search(pool: &PgPool, filter: &OrderFilter) -> Result<(Vec<Self>, i64), AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        filter.push_conditions(&mut count_builder);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        filter.push_conditions(&mut builder);
        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let orders = builder.build_query_as::<Order>().fetch_all(pool).await?;
        Ok((orders, total))
    }

    pub async fn update_status(pool: &PgPool, id: i64, status: OrderStatus) -> Result<Option<Self>, AppError> {
        let sql = format!(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(status)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(order)
    }

    /// Returns the number of orders changed
    pub async fn bulk_update_status(pool: &PgPool, ids: &[i64], status: OrderStatus) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = ANY($2)")
            .bind(status)
            .bind(ids)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn to_response(&self, items: &[OrderItem]) -> OrderResponse {
        OrderResponse {
            id: self.id,
            user_id: self.user_id,
            is_guest: self.is_guest(),
            total_amount: self.total_amount,
            total_display: format_rupees_simple(self.total_amount),
            status: self.status,
            status_label: self.status.label().to_string(),
            shipping_address: self.shipping_address.clone(),
            phone_number: self.phone_number.clone(),
            items: items
                .iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    medicine_id: item.medicine_id,
                    medicine_name: item.medicine_name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    line_total: item.line_total(),
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OrderItem {
    pub async fn insert_many(conn: &mut PgConnection, order_id: i64, items: &[NewOrderItem]) -> Result<(), AppError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO order_items (order_id, medicine_id, quantity, price) ");
        builder.push_values(items, |mut row, item| {
            row.push_bind(order_id)
                .push_bind(item.medicine_id)
                .push_bind(item.quantity)
                .push_bind(item.price);
        });
        builder.build().execute(conn).await?;

        Ok(())
    }

    pub async fn delete_for_order(conn: &mut PgConnection, order_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn for_order(executor: impl PgExecutor<'_>, order_id: i64) -> Result<Vec<Self>, AppError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.medicine_id, m.name AS medicine_name, oi.quantity, oi.price
            FROM order_items oi
            JOIN medicines m ON m.id = oi.medicine_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(items)
    }

    /// Items for several orders in one round trip
    pub async fn for_orders(pool: &PgPool, order_ids: &[i64]) -> Result<Vec<Self>, AppError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT oi.id, oi.order_id, oi.medicine_id, m.name AS medicine_name, oi.quantity, oi.price
            FROM order_items oi
            JOIN medicines m ON m.id = oi.medicine_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.id
            "#,
        )
        .bind(order_ids)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}
