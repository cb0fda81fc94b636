use chrono::{DateTime, Utc};
use pharmacy_shared::CategoryRequest;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Category row with the number of medicines filed under it
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub medicine_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub async fn create(pool: &PgPool, request: &CategoryRequest) -> Result<Self, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, image, created_at
            "#,
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&request.image)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Case-insensitive name lookup, used to keep category names unique
    pub async fn name_exists(pool: &PgPool, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(except_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image, created_at FROM categories ORDER BY name",
        )
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    pub async fn list_with_counts(pool: &PgPool, search: Option<&str>) -> Result<Vec<CategorySummary>, AppError> {
        let categories = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT c.id, c.name, c.description, c.image, c.created_at, COUNT(m.id) AS medicine_count
            FROM categories c
            LEFT JOIN medicines m ON m.category_id = c.id
            WHERE ($1::TEXT IS NULL OR c.name ILIKE $1 OR c.description ILIKE $1)
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .bind(search.map(|s| format!("%{}%", s.trim())))
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    pub async fn update(pool: &PgPool, id: i64, request: &CategoryRequest) -> Result<Option<Self>, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = $1, description = $2, image = $3
            WHERE id = $4
            RETURNING id, name, description, image, created_at
            "#,
        )
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&request.image)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Delete an empty category. Categories that still own medicines are refused.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let medicine_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM medicines WHERE category_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        if medicine_count > 0 {
            return Err(AppError::Conflict(format!(
                "Category still has {} medicine(s)",
                medicine_count
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
