use chrono::{DateTime, Utc};
use pharmacy_shared::{FeedbackAction, FeedbackForm, FeedbackKind};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CustomerFeedback {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub rating: i32,
    pub feedback: String,
    pub is_approved: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductFeedback {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub name: String,
    pub email: Option<String>,
    pub rating: i32,
    pub feedback: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Approved,
    Pending,
    Featured,
}

impl FeedbackStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(FeedbackStatus::Approved),
            "pending" => Some(FeedbackStatus::Pending),
            "featured" => Some(FeedbackStatus::Featured),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub rating: Option<i32>,
    pub status: Option<FeedbackStatus>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, Default, FromRow, Serialize, Deserialize)]
pub struct FeedbackCounts {
    pub total_customer: i64,
    pub approved_customer: i64,
    pub total_product: i64,
    pub approved_product: i64,
}

/// Moderation flags after an action; `None` means the row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationFlags {
    pub is_approved: bool,
    pub is_featured: bool,
}

/// Apply a moderation action to the current flags.
/// Product feedback has no featured flag, so feature/unfeature are rejected for it.
pub fn moderate(
    kind: FeedbackKind,
    action: FeedbackAction,
    current: ModerationFlags,
) -> Result<Option<ModerationFlags>, AppError> {
    let next = match action {
        FeedbackAction::Approve => ModerationFlags {
            is_approved: true,
            ..current
        },
        FeedbackAction::Unapprove => ModerationFlags {
            is_approved: false,
            is_featured: false,
        },
        FeedbackAction::Feature | FeedbackAction::Unfeature if kind == FeedbackKind::Product => {
            return Err(AppError::Validation(
                "Product feedback cannot be featured".to_string(),
            ))
        }
        FeedbackAction::Feature => ModerationFlags {
            is_approved: true,
            is_featured: true,
        },
        FeedbackAction::Unfeature => ModerationFlags {
            is_featured: false,
            ..current
        },
        FeedbackAction::Delete => return Ok(None),
    };

    Ok(Some(next))
}

fn optional_email(email: &Option<String>) -> Option<String> {
    email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

impl CustomerFeedback {
    pub async fn create(pool: &PgPool, form: &FeedbackForm) -> Result<Self, AppError> {
        let feedback = sqlx::query_as::<_, CustomerFeedback>(
            r#"
            INSERT INTO customer_feedbacks (name, email, rating, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, rating, feedback, is_approved, is_featured, created_at
            "#,
        )
        .bind(form.name.trim())
        .bind(optional_email(&form.email))
        .bind(form.rating)
        .bind(form.feedback.trim())
        .fetch_one(pool)
        .await?;

        Ok(feedback)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let feedback = sqlx::query_as::<_, CustomerFeedback>(
            "SELECT id, name, email, rating, feedback, is_approved, is_featured, created_at FROM customer_feedbacks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(feedback)
    }

    /// Approved feedback for the home page, featured first then newest
    pub async fn approved(pool: &PgPool, limit: i64) -> Result<Vec<Self>, AppError> {
        let feedbacks = sqlx::query_as::<_, CustomerFeedback>(
            r#"
            SELECT id, name, email, rating, feedback, is_approved, is_featured, created_at
            FROM customer_feedbacks
            WHERE is_approved = TRUE
            ORDER BY is_featured DESC, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(feedbacks)
    }

    pub async fn search(pool: &PgPool, filter: &FeedbackFilter) -> Result<(Vec<Self>, i64), AppError> {
        let push_conditions = |builder: &mut QueryBuilder<'_, Postgres>| {
            builder.push(" WHERE 1=1");
            if let Some(rating) = filter.rating {
                builder.push(" AND rating = ");
                builder.push_bind(rating);
            }
            match filter.status {
                Some(FeedbackStatus::Approved) => {
                    builder.push(" AND is_approved = TRUE");
                }
                Some(FeedbackStatus::Pending) => {
                    builder.push(" AND is_approved = FALSE");
                }
                Some(FeedbackStatus::Featured) => {
                    builder.push(" AND is_featured = TRUE");
                }
                None => {}
            }
            if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let pattern = format!("%{}%", search);
                builder.push(" AND (name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR email ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR feedback ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        };

        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customer_feedbacks");
        push_conditions(&mut count_builder);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, name, email, rating, feedback, is_approved, is_featured, created_at FROM customer_feedbacks",
        );
        push_conditions(&mut builder);
        builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let feedbacks = builder.build_query_as::<CustomerFeedback>().fetch_all(pool).await?;
        Ok((feedbacks, total))
    }

    pub async fn set_flags(pool: &PgPool, id: i64, flags: ModerationFlags) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE customer_feedbacks SET is_approved = $1, is_featured = $2 WHERE id = $3")
            .bind(flags.is_approved)
            .bind(flags.is_featured)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customer_feedbacks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn flags(&self) -> ModerationFlags {
        ModerationFlags {
            is_approved: self.is_approved,
            is_featured: self.is_featured,
        }
    }
}

const PRODUCT_FEEDBACK_SELECT: &str = r#"
    SELECT pf.id, pf.medicine_id, m.name AS medicine_name, pf.name, pf.email, pf.rating,
        pf.feedback, pf.is_approved, pf.created_at
    FROM product_feedbacks pf
    JOIN medicines m ON m.id = pf.medicine_id
"#;

impl ProductFeedback {
    pub async fn create(pool: &PgPool, medicine_id: i64, form: &FeedbackForm) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO product_feedbacks (medicine_id, name, email, rating, feedback)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(medicine_id)
        .bind(form.name.trim())
        .bind(optional_email(&form.email))
        .bind(form.rating)
        .bind(form.feedback.trim())
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, AppError> {
        let sql = format!("{} WHERE pf.id = $1", PRODUCT_FEEDBACK_SELECT);
        let feedback = sqlx::query_as::<_, ProductFeedback>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(feedback)
    }

    pub async fn approved_for_medicine(pool: &PgPool, medicine_id: i64, limit: i64) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "{} WHERE pf.medicine_id = $1 AND pf.is_approved = TRUE ORDER BY pf.created_at DESC LIMIT $2",
            PRODUCT_FEEDBACK_SELECT
        );
        let feedbacks = sqlx::query_as::<_, ProductFeedback>(&sql)
            .bind(medicine_id)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(feedbacks)
    }

    pub async fn search(pool: &PgPool, filter: &FeedbackFilter) -> Result<(Vec<Self>, i64), AppError> {
        let push_conditions = |builder: &mut QueryBuilder<'_, Postgres>| {
            builder.push(" WHERE 1=1");
            if let Some(rating) = filter.rating {
                builder.push(" AND pf.rating = ");
                builder.push_bind(rating);
            }
            match filter.status {
                Some(FeedbackStatus::Approved) => {
                    builder.push(" AND pf.is_approved = TRUE");
                }
                Some(FeedbackStatus::Pending) => {
                    builder.push(" AND pf.is_approved = FALSE");
                }
                // product feedback is never featured; the filter is ignored
                Some(FeedbackStatus::Featured) | None => {}
            }
            if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let pattern = format!("%{}%", search);
                builder.push(" AND (pf.name ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR pf.email ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR pf.feedback ILIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR m.name ILIKE ");
                builder.push_bind(pattern);
                builder.push(")");
            }
        };

        let mut count_builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM product_feedbacks pf JOIN medicines m ON m.id = pf.medicine_id",
        );
        push_conditions(&mut count_builder);
        let total: i64 = count_builder.build_query_scalar().fetch_one(pool).await?;

        let mut builder = QueryBuilder::<Postgres>::new(PRODUCT_FEEDBACK_SELECT);
        push_conditions(&mut builder);
        builder.push(" ORDER BY pf.created_at DESC, pf.id DESC LIMIT ");
        builder.push_bind(filter.limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset);

        let feedbacks = builder.build_query_as::<ProductFeedback>().fetch_all(pool).await?;
        Ok((feedbacks, total))
    }

    pub async fn set_approved(pool: &PgPool, id: i64, is_approved: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE product_feedbacks SET is_approved = $1 WHERE id = $2")
            .bind(is_approved)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM product_feedbacks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn flags(&self) -> ModerationFlags {
        ModerationFlags {
            is_approved: self.is_approved,
            is_featured: false,
        }
    }
}

impl FeedbackCounts {
    pub async fn load(pool: &PgPool) -> Result<Self, AppError> {
        let counts = sqlx::query_as::<_, FeedbackCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM customer_feedbacks) AS total_customer,
                (SELECT COUNT(*) FROM customer_feedbacks WHERE is_approved = TRUE) AS approved_customer,
                (SELECT COUNT(*) FROM product_feedbacks) AS total_product,
                (SELECT COUNT(*) FROM product_feedbacks WHERE is_approved = TRUE) AS approved_product
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENDING: ModerationFlags = ModerationFlags {
        is_approved: false,
        is_featured: false,
    };

    #[test]
    fn feature_also_approves() {
        let next = moderate(FeedbackKind::Customer, FeedbackAction::Feature, PENDING).unwrap();
        assert_eq!(
            next,
            Some(ModerationFlags {
                is_approved: true,
                is_featured: true
            })
        );
    }

    #[test]
    fn unapprove_clears_featured() {
        let featured = ModerationFlags {
            is_approved: true,
            is_featured: true,
        };
        let next = moderate(FeedbackKind::Customer, FeedbackAction::Unapprove, featured).unwrap();
        assert_eq!(next, Some(PENDING));
    }

    #[test]
    fn unfeature_keeps_approval() {
        let featured = ModerationFlags {
            is_approved: true,
            is_featured: true,
        };
        let next = moderate(FeedbackKind::Customer, FeedbackAction::Unfeature, featured)
            .unwrap()
            .unwrap();
        assert!(next.is_approved);
        assert!(!next.is_featured);
    }

    #[test]
    fn product_feedback_cannot_be_featured() {
        assert!(moderate(FeedbackKind::Product, FeedbackAction::Feature, PENDING).is_err());
        assert_eq!(
            moderate(FeedbackKind::Product, FeedbackAction::Approve, PENDING).unwrap(),
            Some(ModerationFlags {
                is_approved: true,
                is_featured: false
            })
        );
    }

    #[test]
    fn delete_drops_the_row() {
        assert_eq!(
            moderate(FeedbackKind::Customer, FeedbackAction::Delete, PENDING).unwrap(),
            None
        );
        assert_eq!(FeedbackStatus::parse("featured"), Some(FeedbackStatus::Featured));
        assert_eq!(FeedbackStatus::parse("all"), None);
    }
}
