use pharmacy_shared::{FeedbackAction, FeedbackForm, FeedbackKind, PaginatedResponse, FEEDBACK_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::models::feedback::{
    moderate, CustomerFeedback, FeedbackCounts, FeedbackFilter, FeedbackStatus, ProductFeedback,
};
use crate::models::medicine::Medicine;
use crate::models::page_window;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackListParams {
    #[serde(rename = "type", default)]
    pub kind: FeedbackKind,
    pub rating: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
}

impl FeedbackListParams {
    pub fn to_filter(&self) -> (FeedbackFilter, i64) {
        let (page, limit, offset) = page_window(self.page, FEEDBACK_PAGE_SIZE);
        let filter = FeedbackFilter {
            rating: self
                .rating
                .as_deref()
                .and_then(|r| r.trim().parse::<i32>().ok())
                .filter(|r| (pharmacy_shared::MIN_RATING..=pharmacy_shared::MAX_RATING).contains(r)),
            status: self.status.as_deref().and_then(FeedbackStatus::parse),
            search: self.search.clone(),
            limit,
            offset,
        };
        (filter, page)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FeedbackPage {
    Customer(PaginatedResponse<CustomerFeedback>),
    Product(PaginatedResponse<ProductFeedback>),
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackListing {
    pub kind: FeedbackKind,
    pub feedbacks: FeedbackPage,
    pub counts: FeedbackCounts,
}

/// Trim text fields before validating a public submission
pub fn clean_feedback_form(form: &FeedbackForm) -> Result<FeedbackForm, AppError> {
    let cleaned = FeedbackForm {
        name: form.name.trim().to_string(),
        email: form.email.as_ref().map(|e| e.trim().to_string()),
        rating: form.rating,
        feedback: form.feedback.trim().to_string(),
    };
    cleaned.validate()?;
    Ok(cleaned)
}

#[derive(Clone)]
pub struct FeedbackService {
    db_pool: PgPool,
}

impl FeedbackService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn submit_customer(&self, form: &FeedbackForm) -> Result<CustomerFeedback, AppError> {
        let form = clean_feedback_form(form)?;
        let feedback = CustomerFeedback::create(&self.db_pool, &form).await?;
        info!("Received customer feedback {} ({} stars)", feedback.id, feedback.rating);
        Ok(feedback)
    }

    /// Returns the reviewed medicine so the caller can thank by name
    pub async fn submit_product(&self, medicine_id: i64, form: &FeedbackForm) -> Result<Medicine, AppError> {
        let form = clean_feedback_form(form)?;
        let medicine = Medicine::find_active_by_id(&self.db_pool, medicine_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Medicine not found".to_string()))?;
        let id = ProductFeedback::create(&self.db_pool, medicine_id, &form).await?;
        info!("Received product feedback {} for medicine {}", id, medicine_id);
        Ok(medicine)
    }

    pub async fn list(&self, params: &FeedbackListParams) -> Result<FeedbackListing, AppError> {
        let (filter, page) = params.to_filter();
        let feedbacks = match params.kind {
            FeedbackKind::Customer => {
                let (rows, total) = CustomerFeedback::search(&self.db_pool, &filter).await?;
                FeedbackPage::Customer(PaginatedResponse::new(rows, total, page, filter.limit))
            }
            FeedbackKind::Product => {
                let (rows, total) = ProductFeedback::search(&self.db_pool, &filter).await?;
                FeedbackPage::Product(PaginatedResponse::new(rows, total, page, filter.limit))
            }
        };

        Ok(FeedbackListing {
            kind: params.kind,
            feedbacks,
            counts: FeedbackCounts::load(&self.db_pool).await?,
        })
    }

    /// Apply a moderation action and return a message naming the author
    pub async fn apply_action(&self, kind: FeedbackKind, id: i64, action: FeedbackAction) -> Result<String, AppError> {
        let not_found = || AppError::NotFound("Feedback not found".to_string());

        let (name, current) = match kind {
            FeedbackKind::Customer => {
                let feedback = CustomerFeedback::find_by_id(&self.db_pool, id).await?.ok_or_else(not_found)?;
                (feedback.name.clone(), feedback.flags())
            }
            FeedbackKind::Product => {
                let feedback = ProductFeedback::find_by_id(&self.db_pool, id).await?.ok_or_else(not_found)?;
                (feedback.name.clone(), feedback.flags())
            }
        };

        match moderate(kind, action, current)? {
            Some(flags) => match kind {
                FeedbackKind::Customer => {
                    CustomerFeedback::set_flags(&self.db_pool, id, flags).await?;
                }
                FeedbackKind::Product => {
                    ProductFeedback::set_approved(&self.db_pool, id, flags.is_approved).await?;
                }
            },
            None => {
                match kind {
                    FeedbackKind::Customer => CustomerFeedback::delete(&self.db_pool, id).await?,
                    FeedbackKind::Product => ProductFeedback::delete(&self.db_pool, id).await?,
                };
            }
        }

        info!("Feedback {} ({:?}) moderated: {:?}", id, kind, action);

        let message = match action {
            FeedbackAction::Approve => format!("Feedback from \"{}\" approved!", name),
            FeedbackAction::Unapprove => format!("Feedback from \"{}\" unapproved!", name),
            FeedbackAction::Feature => format!("Feedback from \"{}\" marked as featured!", name),
            FeedbackAction::Unfeature => format!("Feedback from \"{}\" removed from featured!", name),
            FeedbackAction::Delete => format!("Feedback from \"{}\" deleted!", name),
        };
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_drop_out_of_range_ratings() {
        let params = FeedbackListParams {
            rating: Some("9".to_string()),
            status: Some("pending".to_string()),
            page: Some(3),
            ..FeedbackListParams::default()
        };
        let (filter, page) = params.to_filter();
        assert_eq!(filter.rating, None);
        assert_eq!(filter.status, Some(FeedbackStatus::Pending));
        assert_eq!(page, 3);
        assert_eq!(filter.offset, 40);
    }

    #[test]
    fn submissions_are_trimmed_then_validated() {
        let form = FeedbackForm {
            name: "  Ravi ".to_string(),
            email: Some("  ".to_string()),
            rating: 4,
            feedback: " Fast delivery ".to_string(),
        };
        let cleaned = clean_feedback_form(&form).unwrap();
        assert_eq!(cleaned.name, "Ravi");
        assert_eq!(cleaned.feedback, "Fast delivery");

        let blank_name = FeedbackForm {
            name: "   ".to_string(),
            ..form
        };
        assert!(matches!(
            clean_feedback_form(&blank_name),
            Err(AppError::InvalidForm(fields)) if fields.contains_key("name")
        ));
    }
}
