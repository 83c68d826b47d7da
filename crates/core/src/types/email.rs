//! Customer email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string is not an acceptable [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is required")]
    Empty,

    #[error("email must be at most {} characters", Email::MAX_LENGTH)]
    TooLong,

    /// Not exactly one `@` with something on both sides.
    #[error("email must look like name@domain")]
    Shape,

    /// A local or domain label is empty, or uses a character outside
    /// letters, digits and `_`.
    #[error("email contains an invalid label")]
    Label,

    /// The domain has no top-level part of at least two letters.
    #[error("email domain must end in a top-level domain")]
    TopLevelDomain,
}

/// A validated email address.
///
/// Both halves are runs of word characters (`[A-Za-z0-9_]`) joined by
/// single `.` or `-` separators, and the domain needs at least one dot with
/// an alphabetic top-level part. Accounts, OTP codes and orders use
/// [`Email::normalized`] so lookups are case-insensitive.
///
/// ```
/// use real_taste_core::Email;
///
/// assert!(Email::parse("asha.k@real-taste.cafe").is_ok());
/// assert!(Email::parse("asha@localhost").is_err());
/// assert!(Email::parse("asha..k@example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate `s` as-is.
    ///
    /// # Errors
    ///
    /// Returns the [`EmailError`] for the first rule `s` breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::Shape)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(EmailError::Shape);
        }

        if !labels_are_valid(local) || !labels_are_valid(domain) {
            return Err(EmailError::Label);
        }

        match domain.rsplit_once('.') {
            Some((_, tld)) if tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::TopLevelDomain),
        }
    }

    /// Trim and lowercase, then [`Email::parse`].
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`].
    pub fn normalized(s: &str) -> Result<Self, EmailError> {
        Self::parse(&s.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Word-character runs separated by single `.` or `-`.
fn labels_are_valid(part: &str) -> bool {
    part.split(['.', '-']).all(|label| {
        !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        // Stored addresses were validated on the way in.
        Ok(Self(<String as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_customer_addresses() {
        for ok in [
            "asha@example.com",
            "asha.k@example.co.in",
            "ravi-kumar@mail.real-taste.cafe",
            "order_desk@realtastecafe.com",
            "it-3f2a9c@example.com",
        ] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::Shape));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::Shape));
        assert_eq!(Email::parse("asha@"), Err(EmailError::Shape));
        assert_eq!(Email::parse("a@b@example.com"), Err(EmailError::Shape));
    }

    #[test]
    fn test_label_errors() {
        assert_eq!(Email::parse("as ha@example.com"), Err(EmailError::Label));
        assert_eq!(Email::parse("asha..k@example.com"), Err(EmailError::Label));
        assert_eq!(Email::parse(".asha@example.com"), Err(EmailError::Label));
        assert_eq!(Email::parse("asha@example-.com"), Err(EmailError::Label));
        assert_eq!(Email::parse("asha+chai@example.com"), Err(EmailError::Label));
    }

    #[test]
    fn test_top_level_domain() {
        assert_eq!(Email::parse("asha@localhost"), Err(EmailError::TopLevelDomain));
        assert_eq!(Email::parse("asha@example.c"), Err(EmailError::TopLevelDomain));
        assert_eq!(Email::parse("asha@example.123"), Err(EmailError::TopLevelDomain));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong));
    }

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let email = Email::normalized("  Asha.K@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "asha.k@example.com");
        assert_eq!(email.to_string(), "asha.k@example.com");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "ravi@example.com".parse().unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"ravi@example.com\"");
    }
}
