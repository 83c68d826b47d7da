//! Customer mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileNumberError {
    /// The input is not exactly ten digits.
    #[error("mobile number must be exactly 10 digits")]
    InvalidLength,
    /// The input contains a non-digit character.
    #[error("mobile number must contain only digits")]
    NonDigit,
    /// The first digit is not 6-9.
    #[error("mobile number must start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// A ten-digit Indian mobile number (`[6-9]` followed by nine digits).
///
/// Staff call this number when a takeaway order is ready for pickup.
///
/// ```
/// use real_taste_core::MobileNumber;
///
/// assert!(MobileNumber::parse("9876543210").is_ok());
/// assert!(MobileNumber::parse("1234567890").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Required number of digits.
    pub const LENGTH: usize = 10;

    /// Parse a mobile number. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not ten ASCII digits starting with 6-9.
    pub fn parse(s: &str) -> Result<Self, MobileNumberError> {
        let s = s.trim();

        if s.len() != Self::LENGTH {
            return Err(MobileNumberError::InvalidLength);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }

        if !matches!(s.as_bytes().first(), Some(b'6'..=b'9')) {
            return Err(MobileNumberError::InvalidPrefix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MobileNumber {
    type Error = MobileNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MobileNumber> for String {
    fn from(number: MobileNumber) -> Self {
        number.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MobileNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MobileNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MobileNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        for n in ["6000000000", "7123456789", "8999999999", "9465520816"] {
            assert!(MobileNumber::parse(n).is_ok(), "{n} should be valid");
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let number = MobileNumber::parse(" 9876543210 ").expect("valid");
        assert_eq!(number.as_str(), "9876543210");
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            MobileNumber::parse("987654321"),
            Err(MobileNumberError::InvalidLength)
        );
        assert_eq!(
            MobileNumber::parse("+919876543210"),
            Err(MobileNumberError::InvalidLength)
        );
    }

    #[test]
    fn test_parse_non_digit() {
        assert_eq!(
            MobileNumber::parse("98765-3210"),
            Err(MobileNumberError::NonDigit)
        );
    }

    #[test]
    fn test_parse_bad_prefix() {
        assert_eq!(
            MobileNumber::parse("5876543210"),
            Err(MobileNumberError::InvalidPrefix)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<MobileNumber>("\"9876543210\"").is_ok());
        assert!(serde_json::from_str::<MobileNumber>("\"0123456789\"").is_err());
    }
}
