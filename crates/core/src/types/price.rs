//! Type-safe price representation using decimal arithmetic.
//!
//! All menu prices are in Indian rupees, so there is no currency field.
//! Amounts are rounded to two decimal places on construction.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// Multiplying by a quantity overflowed.
    #[error("price overflow")]
    Overflow,
}

/// A non-negative rupee amount.
///
/// Serializes as a decimal string (`"120.00"`) and accepts either a JSON
/// number or a string on input.
///
/// ## Examples
///
/// ```
/// use real_taste_core::Price;
/// use rust_decimal::Decimal;
///
/// let chai = Price::new(Decimal::new(2500, 2)).unwrap();
/// assert_eq!(chai.to_string(), "₹25.00");
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// A zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Line total for `quantity` units at this price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit in a decimal.
    pub fn times(&self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Sum two prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the sum does not fit in a decimal.
    pub fn checked_add(&self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

// SQLx support (with postgres feature), stored as NUMERIC(10, 2)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rupees(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Price::new(Decimal::new(-50, 2)), Err(PriceError::Negative));
    }

    #[test]
    fn test_new_accepts_zero() {
        assert!(Price::new(Decimal::ZERO).unwrap().is_zero());
    }

    #[test]
    fn test_new_rounds_to_two_places() {
        let price = Price::new(Decimal::new(12_345, 3)).unwrap();
        assert_eq!(price.amount(), Decimal::new(1234, 2));
    }

    #[test]
    fn test_times_quantity() {
        assert_eq!(rupees(12_050).times(3).unwrap(), rupees(36_150));
        assert!(rupees(12_050).times(0).unwrap().is_zero());
    }

    #[test]
    fn test_sum() {
        let total: Price = [rupees(1000), rupees(2550), rupees(50)].into_iter().sum();
        assert_eq!(total, rupees(3600));
    }

    #[test]
    fn test_display_uses_rupee_symbol() {
        assert_eq!(rupees(9900).to_string(), "₹99.00");
    }

    #[test]
    fn test_deserialize_from_number_and_string() {
        let from_number: Price = serde_json::from_str("120.5").unwrap();
        let from_string: Price = serde_json::from_str("\"120.50\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }
}
