//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use real_taste_core::{Email, UserId, UserRole};

use super::{ValidationError, require_text};

/// Maximum display name length.
pub const MAX_NAME_LENGTH: usize = 50;

/// A registered customer or staff member.
///
/// The password hash is never part of this type; it lives in its own table
/// and is only loaded by the login path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate and normalize a display name.
///
/// # Errors
///
/// Returns `ValidationError` if the name is blank or longer than 50 characters.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    require_text(name, "Name", MAX_NAME_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(" Aman "), Ok("Aman".to_string()));
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }
}
