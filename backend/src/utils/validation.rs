use regex::Regex;
use validator::ValidationError;

const WHATSAPP_PATTERN: &str = r"^\+\d{10,15}$";
const PERSON_NAME_PATTERN: &str = r"^[a-zA-Z\s\-'\.]+$";

fn error_with_message(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Blank form values mean "not set"
pub fn blank_to_none(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Normalize a social profile link: add a missing scheme, require the
/// expected domain and upgrade plain http to https.
pub fn normalize_social_url(url: &str, expected_domain: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    let mut normalized = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    if !validator::validate_url(normalized.as_str()) {
        return Err(error_with_message(
            "url",
            format!("Please enter a valid URL for {}", expected_domain),
        ));
    }

    if !normalized.to_lowercase().contains(expected_domain) {
        return Err(error_with_message(
            "domain",
            format!("URL should be for {}", expected_domain),
        ));
    }

    if let Some(rest) = normalized.strip_prefix("http://") {
        normalized = format!("https://{}", rest);
    }

    Ok(normalized)
}

/// Strip everything but digits and '+', then require +<country code><number>
pub fn clean_whatsapp_number(number: &str) -> Result<String, ValidationError> {
    let cleaned: String = number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let pattern = Regex::new(WHATSAPP_PATTERN).map_err(|_| ValidationError::new("invalid_pattern"))?;
    if !pattern.is_match(&cleaned) {
        return Err(error_with_message(
            "whatsapp_format",
            "WhatsApp number must be in format +CCXXXXXXXXXX (country code + phone number)".to_string(),
        ));
    }

    Ok(cleaned)
}

/// Digits-only number for wa.me links, falling back to the shop's number
pub fn whatsapp_link_number(number: Option<&str>) -> String {
    let digits: String = number
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        pharmacy_shared::DEFAULT_WHATSAPP_NUMBER.to_string()
    } else {
        digits
    }
}

/// Letters, spaces, hyphens, apostrophes and dots only
pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    let pattern = Regex::new(PERSON_NAME_PATTERN).map_err(|_| ValidationError::new("invalid_pattern"))?;
    if !pattern.is_match(name.trim()) {
        return Err(error_with_message(
            "name_format",
            "Name can only contain letters, spaces, hyphens, and apostrophes".to_string(),
        ));
    }
    Ok(())
}
