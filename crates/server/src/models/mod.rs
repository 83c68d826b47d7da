//! Domain models for the café API.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`]. They serialize to the camelCase JSON the web
//! client consumes.

pub mod cart;
pub mod category;
pub mod contact;
pub mod order;
pub mod pagination;
pub mod product;
pub mod session;
pub mod settings;
pub mod user;

use thiserror::Error;

pub use cart::{AddToCart, Cart, CartLine};
pub use category::{Category, CategoryInput, CategoryNode, build_category_tree};
pub use contact::{ContactForm, ContactMessage, ContactStatusUpdate, NewContactMessage};
pub use order::{
    CreateOrderRequest, DailyOrders, NewOrder, Order, OrderCustomer, OrderItem, OrderLineRequest,
    OrderStats, PaymentResult, PaymentUpdate, StatusUpdate,
};
pub use pagination::{PageQuery, Pagination};
pub use product::{Product, ProductInput, ProductSort, Review, ReviewInput};
pub use session::{CurrentUser, VerifiedOtp, keys as session_keys};
pub use settings::{
    BusinessHours, BusinessHoursUpdate, PricingUpdate, ShopSettings, ShopSettingsUpdate,
    StoreSettings, StoreSettingsUpdate,
};
pub use user::User;

/// A client-supplied value failed validation.
///
/// The message is shown to the client verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Require a trimmed, non-empty string of at most `max` characters.
pub(crate) fn require_text(value: &str, field: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    check_max_len(trimmed, field, max)?;
    Ok(trimmed.to_owned())
}

/// Reject strings longer than `max` characters (not bytes).
pub(crate) fn check_max_len(value: &str, field: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(format!(
            "{field} cannot be more than {max} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  Masala Chai ", "Name", 50), Ok("Masala Chai".to_string()));
    }

    #[test]
    fn test_require_text_rejects_blank() {
        assert_eq!(
            require_text("   ", "Name", 50),
            Err(ValidationError::new("Name is required"))
        );
    }

    #[test]
    fn test_check_max_len_counts_chars() {
        // 'é' is two bytes but one character
        assert!(check_max_len("ééééé", "Name", 5).is_ok());
        assert!(check_max_len("éééééé", "Name", 5).is_err());
    }
}
