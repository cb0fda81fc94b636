use std::time::Duration;

// Pagination defaults
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const SEARCH_PAGE_SIZE: i64 = 12;
pub const FEEDBACK_PAGE_SIZE: i64 = 20;

// Storefront listings
pub const HOME_FEATURED_MEDICINES: i64 = 8;
pub const HOME_FEEDBACKS: i64 = 6;
pub const DETAIL_PRODUCT_FEEDBACKS: i64 = 6;

// Search suggestions
pub const SUGGESTION_MIN_QUERY_LEN: usize = 2;
pub const SUGGESTION_MEDICINE_LIMIT: i64 = 5;
pub const SUGGESTION_MANUFACTURER_LIMIT: i64 = 3;

// Inventory
pub const LOW_STOCK_THRESHOLD: i32 = 10;
pub const MAX_LINE_QUANTITY: i32 = 999;

// Feedback
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

// Sessions
pub const SESSION_COOKIE_NAME: &str = "sessionid";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60); // 2 weeks

// Site settings
pub const SETTINGS_URL_MAX_LENGTH: usize = 200;
pub const SITE_SETTINGS_ID: i32 = 1;
pub const DEFAULT_WHATSAPP_NUMBER: &str = "919710036499";

// Currency
pub const CURRENCY_SYMBOL: &str = "₹";

// Storefront messages
pub const MSG_CART_EMPTY: &str = "Your cart is empty!";
pub const MSG_ITEM_REMOVED: &str = "Item removed from cart!";
pub const MSG_NO_ORDERS_FOR_PHONE: &str = "No orders found with this phone number.";
pub const MSG_ORDER_NOT_FOUND: &str = "Order not found. Please check your Order ID and Phone Number.";
pub const MSG_PHONE_REQUIRED_FOR_ORDER: &str = "Please enter your phone number to track the order.";
pub const MSG_PHONE_REQUIRED: &str = "Please enter your phone number to track orders.";
pub const MSG_FEEDBACK_THANKS: &str = "Thank you for your feedback! 🙏";
pub const MSG_CONTACT_THANKS: &str = "Thank you for contacting us! We will get back to you soon.";
