//! Session-related types.
//!
//! Types stored in the session for authentication and checkout state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use real_taste_core::{Email, UserId, UserRole};

use super::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// authorize admin routes without a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether this user may access the back office.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Proof that the session owner verified an emailed OTP.
///
/// Written by `POST /api/otp/verify` and consumed by order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedOtp {
    pub email: Email,
    pub verified_at: DateTime<Utc>,
}

impl VerifiedOtp {
    /// How long a verification stays usable for checkout.
    pub const VALIDITY_MINUTES: i64 = 10;

    #[must_use]
    pub fn new(email: Email) -> Self {
        Self {
            email,
            verified_at: Utc::now(),
        }
    }

    /// Whether this verification covers `email` at time `now`.
    #[must_use]
    pub fn is_valid_for(&self, email: &Email, now: DateTime<Utc>) -> bool {
        self.email == *email
            && now >= self.verified_at
            && now - self.verified_at <= Duration::minutes(Self::VALIDITY_MINUTES)
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the most recent OTP verification.
    pub const VERIFIED_OTP: &str = "verified_otp";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[test]
    fn test_verified_otp_valid_within_window() {
        let marker = VerifiedOtp::new(email("asha@example.com"));
        let later = marker.verified_at + Duration::minutes(9);
        assert!(marker.is_valid_for(&email("asha@example.com"), later));
    }

    #[test]
    fn test_verified_otp_expires() {
        let marker = VerifiedOtp::new(email("asha@example.com"));
        let later = marker.verified_at + Duration::minutes(11);
        assert!(!marker.is_valid_for(&email("asha@example.com"), later));
    }

    #[test]
    fn test_verified_otp_bound_to_email() {
        let marker = VerifiedOtp::new(email("asha@example.com"));
        assert!(!marker.is_valid_for(&email("ravi@example.com"), marker.verified_at));
    }
}
