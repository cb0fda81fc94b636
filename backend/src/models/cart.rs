use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub medicine_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Cart row joined with the live medicine data it points at
#[derive(Debug, Clone, FromRow)]
pub struct CartItemRow {
    pub medicine_id: i64,
    pub quantity: i32,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

impl Cart {
    pub async fn find_by_user(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<Option<Self>, AppError> {
        let cart = sqlx::query_as::<_, Cart>("SELECT id, user_id, created_at FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(cart)
    }

    /// Lock the member's cart row for the rest of the transaction
    pub async fn lock_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Self>, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at FROM carts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(cart)
    }

    /// Carts are created lazily, on the first add
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(cart)
    }
}

impl CartItem {
    /// Insert at quantity 1 or bump an existing line by one, in a single statement.
    /// The quantity never goes past `max_quantity`.
    pub async fn add_one(pool: &PgPool, cart_id: i64, medicine_id: i64, max_quantity: i32) -> Result<Self, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (cart_id, medicine_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (cart_id, medicine_id)
            DO UPDATE SET quantity = LEAST(cart_items.quantity, $3 - 1) + 1
            RETURNING id, cart_id, medicine_id, quantity, created_at
            "#,
        )
        .bind(cart_id)
        .bind(medicine_id)
        .bind(max_quantity)
        .fetch_one(pool)
        .await?;

        Ok(item)
    }

    /// Returns false when the member has no such line
    pub async fn set_quantity(pool: &PgPool, user_id: Uuid, medicine_id: i64, quantity: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = $1
            FROM carts
            WHERE cart_items.cart_id = carts.id AND carts.user_id = $2 AND cart_items.medicine_id = $3
            "#,
        )
        .bind(quantity)
        .bind(user_id)
        .bind(medicine_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(pool: &PgPool, user_id: Uuid, medicine_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            USING carts
            WHERE cart_items.cart_id = carts.id AND carts.user_id = $1 AND cart_items.medicine_id = $2
            "#,
        )
        .bind(user_id)
        .bind(medicine_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM cart_items USING carts WHERE cart_items.cart_id = carts.id AND carts.user_id = $1",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Member cart lines priced from the medicines table, oldest line first
    pub async fn rows_for_user(executor: impl PgExecutor<'_>, user_id: Uuid) -> Result<Vec<CartItemRow>, AppError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT ci.medicine_id, ci.quantity, m.name, m.price, m.image
            FROM cart_items ci
            JOIN carts c ON c.id = ci.cart_id
            JOIN medicines m ON m.id = ci.medicine_id
            WHERE c.user_id = $1
            ORDER BY ci.created_at, ci.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}
