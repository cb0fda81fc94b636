use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// Account roles carried in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Staff,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Customer => write!(f, "customer"),
            UserRole::Staff => write!(f, "staff"),
        }
    }
}

// Order lifecycle. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Human readable label used by storefront pages
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Confirmed => write!(f, "CONFIRMED"),
            OrderStatus::Shipped => write!(f, "SHIPPED"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

// Over the counter vs prescription required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "prescription_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PrescriptionType {
    Otc,
    Rx,
}

impl Default for PrescriptionType {
    fn default() -> Self {
        PrescriptionType::Otc
    }
}

impl PrescriptionType {
    pub fn label(&self) -> &'static str {
        match self {
            PrescriptionType::Otc => "Over the Counter",
            PrescriptionType::Rx => "Prescription Required",
        }
    }
}

impl fmt::Display for PrescriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrescriptionType::Otc => write!(f, "OTC"),
            PrescriptionType::Rx => write!(f, "RX"),
        }
    }
}

impl FromStr for PrescriptionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OTC" => Ok(PrescriptionType::Otc),
            "RX" => Ok(PrescriptionType::Rx),
            _ => Err(ParseEnumError::new("prescription type", s)),
        }
    }
}

// Media gallery video kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "video_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoType {
    Reel,
    Promo,
    Testimonial,
    Tutorial,
    News,
    Other,
}

impl Default for VideoType {
    fn default() -> Self {
        VideoType::Reel
    }
}

impl VideoType {
    pub fn label(&self) -> &'static str {
        match self {
            VideoType::Reel => "Reel",
            VideoType::Promo => "Promotional Video",
            VideoType::Testimonial => "Customer Testimonial",
            VideoType::Tutorial => "Tutorial/How-to",
            VideoType::News => "News/Press",
            VideoType::Other => "Other",
        }
    }
}

impl FromStr for VideoType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REEL" => Ok(VideoType::Reel),
            "PROMO" => Ok(VideoType::Promo),
            "TESTIMONIAL" => Ok(VideoType::Testimonial),
            "TUTORIAL" => Ok(VideoType::Tutorial),
            "NEWS" => Ok(VideoType::News),
            "OTHER" => Ok(VideoType::Other),
            _ => Err(ParseEnumError::new("video type", s)),
        }
    }
}

/// Feedback ratings run from 1 (bad) to 5 (excellent)
pub fn rating_label(rating: i32) -> &'static str {
    match rating {
        1 => "Bad",
        2 => "Poor",
        3 => "Average",
        4 => "Good",
        5 => "Excellent",
        _ => "Unknown",
    }
}

/// Storefront flash message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}
