use pharmacy_shared::{ContactForm, PaginatedResponse, DEFAULT_PAGE_SIZE};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::models::contact::ContactMessage;
use crate::models::page_window;
use crate::utils::validation::validate_person_name;

/// Trim, lower-case the email and run field checks
pub fn clean_contact_form(form: &ContactForm) -> Result<ContactForm, AppError> {
    let cleaned = ContactForm {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        subject: form.subject.trim().to_string(),
        message: form.message.trim().to_string(),
    };

    let mut errors = match cleaned.validate() {
        Ok(()) => std::collections::BTreeMap::new(),
        Err(e) => match AppError::from(e) {
            AppError::InvalidForm(fields) => fields,
            other => return Err(other),
        },
    };

    if !errors.contains_key("name") {
        if let Err(e) = validate_person_name(&cleaned.name) {
            let message = e.message.map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string());
            errors.entry("name".to_string()).or_default().push(message);
        }
    }

    if !errors.is_empty() {
        return Err(AppError::InvalidForm(errors));
    }
    Ok(cleaned)
}

#[derive(Clone)]
pub struct ContactService {
    db_pool: PgPool,
}

impl ContactService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn submit(&self, form: &ContactForm, ip_address: Option<&str>) -> Result<ContactMessage, AppError> {
        let form = clean_contact_form(form)?;
        let message = ContactMessage::create(&self.db_pool, &form, ip_address).await?;
        info!("Contact message {} received", message.id);
        Ok(message)
    }

    pub async fn list(&self, unread_only: bool, page: Option<i64>) -> Result<PaginatedResponse<ContactMessage>, AppError> {
        let (page, limit, offset) = page_window(page, DEFAULT_PAGE_SIZE);
        let (messages, total) = ContactMessage::list(&self.db_pool, unread_only, limit, offset).await?;
        Ok(PaginatedResponse::new(messages, total, page, limit))
    }

    pub async fn set_read(&self, id: i64, is_read: bool) -> Result<(), AppError> {
        if !ContactMessage::set_read(&self.db_pool, id, is_read).await? {
            return Err(AppError::NotFound("Message not found".to_string()));
        }
        Ok(())
    }
}
