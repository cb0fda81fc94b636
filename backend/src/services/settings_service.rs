use pharmacy_shared::{SiteSettingsForm, SETTINGS_URL_MAX_LENGTH};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::info;
use validator::ValidationError;

use crate::error::AppError;
use crate::models::site_settings::{SettingsUpdate, SiteSettings};
use crate::utils::validation::{blank_to_none, clean_whatsapp_number, normalize_social_url, whatsapp_link_number};

/// Settings as templates consume them, with the wa.me number resolved
#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    #[serde(flatten)]
    pub settings: SiteSettings,
    pub whatsapp_link_number: String,
}

/// Validate and normalize every field of the settings form.
/// Errors are collected per field instead of stopping at the first one.
pub fn clean_settings_form(form: &SiteSettingsForm) -> Result<SettingsUpdate, AppError> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let mut social = |field: &str, value: &str, domain: &str| -> Option<String> {
        let value = blank_to_none(value)?;
        match normalize_social_url(value, domain) {
            Ok(url) => Some(url),
            Err(e) => {
                errors.entry(field.to_string()).or_default().push(message_of(&e));
                None
            }
        }
    };

    let facebook_url = social("facebook_url", &form.facebook_url, "facebook.com");
    let instagram_url = social("instagram_url", &form.instagram_url, "instagram.com");
    let youtube_url = social("youtube_url", &form.youtube_url, "youtube.com");
    let twitter_url = social("twitter_url", &form.twitter_url, "twitter.com");
    let linkedin_url = social("linkedin_url", &form.linkedin_url, "linkedin.com");

    let mut website_url = match blank_to_none(&form.website_url) {
        Some(url) => {
            let url = if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{}", url)
            };
            if validator::validate_url(url.as_str()) {
                Some(url)
            } else {
                errors
                    .entry("website_url".to_string())
                    .or_default()
                    .push("Please enter a valid URL".to_string());
                None
            }
        }
        None => None,
    };

    // Checked after normalization, which can add a scheme
    let mut limit_length = |field: &str, url: Option<String>| -> Option<String> {
        match url {
            Some(url) if url.chars().count() > SETTINGS_URL_MAX_LENGTH => {
                errors.entry(field.to_string()).or_default().push(format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    SETTINGS_URL_MAX_LENGTH,
                    url.chars().count()
                ));
                None
            }
            other => other,
        }
    };
    let facebook_url = limit_length("facebook_url", facebook_url);
    let instagram_url = limit_length("instagram_url", instagram_url);
    let youtube_url = limit_length("youtube_url", youtube_url);
    let twitter_url = limit_length("twitter_url", twitter_url);
    let linkedin_url = limit_length("linkedin_url", linkedin_url);
    website_url = limit_length("website_url", website_url);

    let whatsapp_number = match blank_to_none(&form.whatsapp_number) {
        Some(number) => match clean_whatsapp_number(number) {
            Ok(cleaned) => Some(cleaned),
            Err(e) => {
                errors
                    .entry("whatsapp_number".to_string())
                    .or_default()
                    .push(message_of(&e));
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(AppError::InvalidForm(errors));
    }

    Ok(SettingsUpdate {
        facebook_url,
        instagram_url,
        youtube_url,
        twitter_url,
        linkedin_url,
        whatsapp_number,
        website_url,
    })
}

fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

#[derive(Clone)]
pub struct SettingsService {
    db_pool: PgPool,
}

impl SettingsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn get(&self) -> Result<SiteSettings, AppError> {
        SiteSettings::get_or_create(&self.db_pool).await
    }

    pub async fn public(&self) -> Result<PublicSettings, AppError> {
        let settings = self.get().await?;
        let whatsapp_link_number = whatsapp_link_number(settings.whatsapp_number.as_deref());
        Ok(PublicSettings {
            settings,
            whatsapp_link_number,
        })
    }

    pub async fn update(&self, form: &SiteSettingsForm) -> Result<SiteSettings, AppError> {
        let update = clean_settings_form(form)?;
        let settings = SiteSettings::save(&self.db_pool, &update).await?;
        info!("Site settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_become_null() {
        let update = clean_settings_form(&SiteSettingsForm::default()).unwrap();
        assert_eq!(update, SettingsUpdate::default());
    }

    #[test]
    fn urls_and_numbers_are_normalized() {
        let form = SiteSettingsForm {
            facebook_url: "facebook.com/corner-pharmacy".to_string(),
            instagram_url: "http://instagram.com/corner.pharmacy".to_string(),
            whatsapp_number: "+91 98765-43210".to_string(),
            website_url: "cornerpharmacy.in".to_string(),
            ..SiteSettingsForm::default()
        };
        let update = clean_settings_form(&form).unwrap();

        assert_eq!(update.facebook_url.as_deref(), Some("https://facebook.com/corner-pharmacy"));
        assert_eq!(update.instagram_url.as_deref(), Some("https://instagram.com/corner.pharmacy"));
        assert_eq!(update.whatsapp_number.as_deref(), Some("+919876543210"));
        assert_eq!(update.website_url.as_deref(), Some("https://cornerpharmacy.in"));
        assert_eq!(update.youtube_url, None);
    }

    #[test]
    fn overlong_urls_are_field_errors() {
        let form = SiteSettingsForm {
            youtube_url: format!("youtube.com/{}", "c".repeat(190)),
            website_url: format!("cornerpharmacy.in/{}", "p".repeat(180)),
            instagram_url: "instagram.com/short".to_string(),
            ..SiteSettingsForm::default()
        };

        match clean_settings_form(&form) {
            Err(AppError::InvalidForm(fields)) => {
                assert!(fields["youtube_url"][0].starts_with("Ensure this value has at most 200 characters"));
                assert!(fields.contains_key("website_url"));
                assert!(!fields.contains_key("instagram_url"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let form = SiteSettingsForm {
            website_url: format!("cornerpharmacy.in/{}", "p".repeat(174)),
            ..SiteSettingsForm::default()
        };
        let update = clean_settings_form(&form).unwrap();
        assert_eq!(update.website_url.map(|url| url.len()), Some(200));
    }

    #[test]
    fn every_bad_field_is_reported() {
        let form = SiteSettingsForm {
            facebook_url: "https://example.com/page".to_string(),
            linkedin_url: "https://facebook.com/not-linkedin".to_string(),
            whatsapp_number: "12345".to_string(),
            ..SiteSettingsForm::default()
        };

        match clean_settings_form(&form) {
            Err(AppError::InvalidForm(fields)) => {
                assert_eq!(fields["facebook_url"], vec!["URL should be for facebook.com".to_string()]);
                assert!(fields.contains_key("linkedin_url"));
                assert!(fields.contains_key("whatsapp_number"));
                assert!(!fields.contains_key("instagram_url"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
