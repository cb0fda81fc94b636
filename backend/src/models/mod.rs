//! Database models for the pharmacy storefront
//!
//! Each model maps to a table and carries its own queries as associated
//! functions on the row type.

pub mod cart;
pub mod category;
pub mod contact;
pub mod feedback;
pub mod media;
pub mod medicine;
pub mod order;
pub mod session;
pub mod site_settings;

// Re-export commonly used models
pub use cart::{Cart, CartItem, CartItemRow};
pub use category::{Category, CategorySummary};
pub use contact::ContactMessage;
pub use feedback::{CustomerFeedback, FeedbackCounts, FeedbackFilter, FeedbackStatus, ProductFeedback};
pub use media::{MediaVideo, VideoFilter, VideoStatus};
pub use medicine::{Medicine, MedicineFilter, MedicineImage, MedicineSort, StockBand};
pub use order::{DateWindow, NewOrder, NewOrderItem, Order, OrderFilter, OrderItem};
pub use session::{GuestCartLine, SessionData, SessionRecord};
pub use site_settings::{SettingsUpdate, SiteSettings};

/// Clamp page / per-page query values and turn them into LIMIT/OFFSET
pub fn page_window(page: Option<i64>, per_page: i64) -> (i64, i64, i64) {
    let per_page = per_page.clamp(1, pharmacy_shared::MAX_PAGE_SIZE);
    // OFFSET must stay representable for absurd page numbers
    let page = page.unwrap_or(1).clamp(1, i64::MAX / per_page);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps_input() {
        assert_eq!(page_window(None, 12), (1, 12, 0));
        assert_eq!(page_window(Some(3), 12), (3, 12, 24));
        assert_eq!(page_window(Some(-4), 20), (1, 20, 0));
        assert_eq!(page_window(Some(2), 1000), (2, 100, 100));

        let last = i64::MAX / 12;
        assert_eq!(page_window(Some(i64::MAX), 12), (last, 12, (last - 1) * 12));
    }
}
