//! Shop and store settings.
//!
//! Both are single-row records. [`ShopSettings`] drives the customer-facing
//! shop state (open hours, maintenance, OTP gate); [`StoreSettings`] is the
//! back-office business profile including pricing rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use real_taste_core::{Email, Price, UserId};

use super::{ValidationError, require_text};

/// Customer-facing shop state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettings {
    pub shop_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    /// `HH:MM`, 24-hour.
    pub open_time: String,
    /// `HH:MM`, 24-hour.
    pub close_time: String,
    /// Minutes.
    pub preparation_time: i32,
    pub is_open: bool,
    pub maintenance_mode: bool,
    pub otp_verification: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            shop_name: "Real Taste Takeaway".to_owned(),
            phone: "+91 9465520816".to_owned(),
            email: "hello@realtastecafe.com".to_owned(),
            address: "UpalHeri, Rajpura, Punjab 140401".to_owned(),
            open_time: "10:00".to_owned(),
            close_time: "21:00".to_owned(),
            preparation_time: 15,
            is_open: true,
            maintenance_mode: false,
            otp_verification: true,
            updated_at: None,
        }
    }
}

impl ShopSettings {
    /// Whether new orders are accepted right now.
    #[must_use]
    pub const fn accepts_orders(&self) -> bool {
        self.is_open && !self.maintenance_mode
    }
}

/// Partial update for [`ShopSettings`]; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSettingsUpdate {
    pub shop_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub preparation_time: Option<i32>,
    pub is_open: Option<bool>,
    pub maintenance_mode: Option<bool>,
    pub otp_verification: Option<bool>,
}

impl ShopSettingsUpdate {
    /// Apply this update on top of `current`, validating each changed field.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for blank text, a malformed time or email,
    /// or a preparation time outside 1..=240 minutes.
    pub fn apply(self, current: &ShopSettings) -> Result<ShopSettings, ValidationError> {
        let mut next = current.clone();
        if let Some(name) = self.shop_name {
            next.shop_name = require_text(&name, "Shop name", 100)?;
        }
        if let Some(phone) = self.phone {
            next.phone = require_text(&phone, "Phone", 30)?;
        }
        if let Some(email) = self.email {
            next.email = Email::normalized(&email)
                .map_err(|_| ValidationError::new("Please enter a valid email"))?
                .into_inner();
        }
        if let Some(address) = self.address {
            next.address = require_text(&address, "Address", 300)?;
        }
        if let Some(open) = self.open_time {
            next.open_time = validate_time(&open, "Open time")?;
        }
        if let Some(close) = self.close_time {
            next.close_time = validate_time(&close, "Close time")?;
        }
        if let Some(minutes) = self.preparation_time {
            if !(1..=240).contains(&minutes) {
                return Err(ValidationError::new(
                    "Preparation time must be between 1 and 240 minutes",
                ));
            }
            next.preparation_time = minutes;
        }
        if let Some(is_open) = self.is_open {
            next.is_open = is_open;
        }
        if let Some(maintenance) = self.maintenance_mode {
            next.maintenance_mode = maintenance;
        }
        if let Some(otp) = self.otp_verification {
            next.otp_verification = otp;
        }
        Ok(next)
    }
}

/// Whether `value` is a 24-hour `HH:MM` time.
#[must_use]
pub fn is_valid_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    let [h1, h2, b':', m1, m2] = bytes else {
        return false;
    };
    if ![h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let hours = (h1 - b'0') * 10 + (h2 - b'0');
    let minutes = (m1 - b'0') * 10 + (m2 - b'0');
    hours < 24 && minutes < 60
}

fn validate_time(value: &str, field: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if is_valid_time(value) {
        Ok(value.to_owned())
    } else {
        Err(ValidationError::new(format!(
            "{field} must be in HH:MM format"
        )))
    }
}

// =============================================================================
// Store settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub day: Weekday,
    pub open: String,
    pub close: String,
    pub is_open: bool,
}

/// Validate a full week of business hours.
///
/// # Errors
///
/// Returns `ValidationError` if a day repeats, a time is malformed, or an
/// open day does not open before it closes.
pub fn validate_business_hours(hours: &[BusinessHours]) -> Result<(), ValidationError> {
    let mut seen = Vec::with_capacity(hours.len());
    for entry in hours {
        if seen.contains(&entry.day) {
            return Err(ValidationError::new(format!(
                "{:?} appears more than once",
                entry.day
            )));
        }
        seen.push(entry.day);
        if !is_valid_time(&entry.open) || !is_valid_time(&entry.close) {
            return Err(ValidationError::new(format!(
                "Invalid time for {:?}, use HH:MM",
                entry.day
            )));
        }
        // Zero-padded HH:MM compares correctly as a string.
        if entry.is_open && entry.open >= entry.close {
            return Err(ValidationError::new(format!(
                "Opening time must be before closing time for {:?}",
                entry.day
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMedia {
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
}

/// Back-office business profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    pub store_email: String,
    pub store_phone: String,
    pub store_address: StoreAddress,
    pub business_hours: Vec<BusinessHours>,
    /// Percentage, 0..=100.
    pub tax_rate: Decimal,
    pub shipping_fee: Price,
    pub free_shipping_threshold: Price,
    /// Orders totalling less than this are rejected; zero disables the check.
    pub minimum_order_amount: Price,
    pub social_media: SocialMedia,
    pub updated_by: Option<UserId>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "Real Taste".to_owned(),
            store_email: "contact@realtastecafe.com".to_owned(),
            store_phone: "+91 9465520816".to_owned(),
            store_address: StoreAddress::default(),
            business_hours: Weekday::ALL
                .into_iter()
                .map(|day| BusinessHours {
                    day,
                    open: "10:00".to_owned(),
                    close: "21:00".to_owned(),
                    is_open: true,
                })
                .collect(),
            tax_rate: Decimal::ZERO,
            shipping_fee: Price::zero(),
            free_shipping_threshold: Price::zero(),
            minimum_order_amount: Price::zero(),
            social_media: SocialMedia::default(),
            updated_by: None,
            updated_at: None,
        }
    }
}

/// Partial update of the store profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettingsUpdate {
    pub store_name: Option<String>,
    pub store_email: Option<String>,
    pub store_phone: Option<String>,
    pub store_address: Option<StoreAddress>,
    pub social_media: Option<SocialMedia>,
}

impl StoreSettingsUpdate {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name or phone, or an invalid email.
    pub fn apply(self, current: &StoreSettings) -> Result<StoreSettings, ValidationError> {
        let mut next = current.clone();
        if let Some(name) = self.store_name {
            next.store_name = require_text(&name, "Store name", 100)?;
        }
        if let Some(email) = self.store_email {
            next.store_email = Email::normalized(&email)
                .map_err(|_| ValidationError::new("Please enter a valid email"))?
                .into_inner();
        }
        if let Some(phone) = self.store_phone {
            next.store_phone = require_text(&phone, "Store phone", 30)?;
        }
        if let Some(address) = self.store_address {
            next.store_address = address;
        }
        if let Some(social) = self.social_media {
            next.social_media = social;
        }
        Ok(next)
    }
}

/// `PUT /api/admin/settings/business-hours` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHoursUpdate {
    pub business_hours: Vec<BusinessHours>,
}

/// `PUT /api/admin/settings/pricing` payload.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingUpdate {
    pub tax_rate: Decimal,
    pub shipping_fee: Price,
    pub free_shipping_threshold: Price,
    pub minimum_order_amount: Price,
}

impl PricingUpdate {
    /// # Errors
    ///
    /// Returns `ValidationError` if the tax rate is outside 0..=100.
    /// Negative amounts are already rejected by [`Price`].
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE_HUNDRED {
            return Err(ValidationError::new("Tax rate must be between 0 and 100"));
        }
        Ok(Self {
            tax_rate: self.tax_rate.round_dp(2),
            ..self
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_time_format() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("9:30"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("ab:cd"));
    }

    #[test]
    fn test_shop_defaults() {
        let settings = ShopSettings::default();
        assert_eq!(settings.shop_name, "Real Taste Takeaway");
        assert!(settings.otp_verification);
        assert!(settings.accepts_orders());
    }

    #[test]
    fn test_maintenance_blocks_orders() {
        let settings = ShopSettings {
            maintenance_mode: true,
            ..ShopSettings::default()
        };
        assert!(!settings.accepts_orders());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let update = ShopSettingsUpdate {
            is_open: Some(false),
            close_time: Some("22:30".to_string()),
            ..ShopSettingsUpdate::default()
        };
        let next = update.apply(&ShopSettings::default()).unwrap();
        assert!(!next.is_open);
        assert_eq!(next.close_time, "22:30");
        assert_eq!(next.open_time, "10:00");
    }

    #[test]
    fn test_update_rejects_bad_time_and_email() {
        let bad_time = ShopSettingsUpdate {
            open_time: Some("7pm".to_string()),
            ..ShopSettingsUpdate::default()
        };
        assert!(bad_time.apply(&ShopSettings::default()).is_err());

        let bad_email = ShopSettingsUpdate {
            email: Some("not-an-email".to_string()),
            ..ShopSettingsUpdate::default()
        };
        assert!(bad_email.apply(&ShopSettings::default()).is_err());
    }

    #[test]
    fn test_update_rejects_preparation_time_out_of_range() {
        let update = ShopSettingsUpdate {
            preparation_time: Some(0),
            ..ShopSettingsUpdate::default()
        };
        assert!(update.apply(&ShopSettings::default()).is_err());
    }

    #[test]
    fn test_store_defaults_cover_week() {
        let settings = StoreSettings::default();
        assert_eq!(settings.business_hours.len(), 7);
        assert!(validate_business_hours(&settings.business_hours).is_ok());
    }

    #[test]
    fn test_business_hours_rejects_duplicates() {
        let day = BusinessHours {
            day: Weekday::Monday,
            open: "10:00".to_string(),
            close: "21:00".to_string(),
            is_open: true,
        };
        assert!(validate_business_hours(&[day.clone(), day]).is_err());
    }

    #[test]
    fn test_business_hours_open_before_close() {
        let mut day = BusinessHours {
            day: Weekday::Sunday,
            open: "21:00".to_string(),
            close: "10:00".to_string(),
            is_open: true,
        };
        assert!(validate_business_hours(std::slice::from_ref(&day)).is_err());
        day.is_open = false;
        assert!(validate_business_hours(&[day]).is_ok());
    }

    #[test]
    fn test_pricing_tax_bounds() {
        let pricing = |tax: i64| PricingUpdate {
            tax_rate: Decimal::new(tax, 0),
            shipping_fee: Price::zero(),
            free_shipping_threshold: Price::zero(),
            minimum_order_amount: Price::zero(),
        };
        assert!(pricing(18).validate().is_ok());
        assert!(pricing(101).validate().is_err());
        assert!(pricing(-1).validate().is_err());
    }
}
