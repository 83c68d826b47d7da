//! Settings database operations.
//!
//! Shop and store settings are singleton rows (`id = 1`). Reads create the
//! row from defaults when it is missing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use real_taste_core::{Price, UserId};

use super::RepositoryError;
use crate::models::settings::{
    BusinessHours, ShopSettings, SocialMedia, StoreAddress, StoreSettings,
};

const SHOP_COLUMNS: &str = "shop_name, phone, email, address, open_time, close_time, \
     preparation_time, is_open, maintenance_mode, otp_verification, updated_at";

const STORE_COLUMNS: &str = "store_name, store_email, store_phone, store_address, \
     business_hours, tax_rate, shipping_fee, free_shipping_threshold, minimum_order_amount, \
     social_media, updated_by, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ShopSettingsRow {
    shop_name: String,
    phone: String,
    email: String,
    address: String,
    open_time: String,
    close_time: String,
    preparation_time: i32,
    is_open: bool,
    maintenance_mode: bool,
    otp_verification: bool,
    updated_at: DateTime<Utc>,
}

impl From<ShopSettingsRow> for ShopSettings {
    fn from(row: ShopSettingsRow) -> Self {
        Self {
            shop_name: row.shop_name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            open_time: row.open_time,
            close_time: row.close_time,
            preparation_time: row.preparation_time,
            is_open: row.is_open,
            maintenance_mode: row.maintenance_mode,
            otp_verification: row.otp_verification,
            updated_at: Some(row.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreSettingsRow {
    store_name: String,
    store_email: String,
    store_phone: String,
    store_address: Json<StoreAddress>,
    business_hours: Json<Vec<BusinessHours>>,
    tax_rate: Decimal,
    shipping_fee: Price,
    free_shipping_threshold: Price,
    minimum_order_amount: Price,
    social_media: Json<SocialMedia>,
    updated_by: Option<i32>,
    updated_at: DateTime<Utc>,
}

impl From<StoreSettingsRow> for StoreSettings {
    fn from(row: StoreSettingsRow) -> Self {
        Self {
            store_name: row.store_name,
            store_email: row.store_email,
            store_phone: row.store_phone,
            store_address: row.store_address.0,
            business_hours: row.business_hours.0,
            tax_rate: row.tax_rate,
            shipping_fee: row.shipping_fee,
            free_shipping_threshold: row.free_shipping_threshold,
            minimum_order_amount: row.minimum_order_amount,
            social_media: row.social_media.0,
            updated_by: row.updated_by.map(UserId::new),
            updated_at: Some(row.updated_at),
        }
    }
}

/// Repository for shop and store settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load shop settings, inserting the defaults if the row is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shop(&self) -> Result<ShopSettings, RepositoryError> {
        sqlx::query("INSERT INTO cafe.shop_settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(self.pool)
            .await?;

        let row = sqlx::query_as::<_, ShopSettingsRow>(&format!(
            "SELECT {SHOP_COLUMNS} FROM cafe.shop_settings WHERE id = 1"
        ))
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Write every shop settings field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_shop(&self, settings: &ShopSettings) -> Result<ShopSettings, RepositoryError> {
        let row = sqlx::query_as::<_, ShopSettingsRow>(&format!(
            r"
            INSERT INTO cafe.shop_settings
                (id, shop_name, phone, email, address, open_time, close_time,
                 preparation_time, is_open, maintenance_mode, otp_verification)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                shop_name = EXCLUDED.shop_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                address = EXCLUDED.address,
                open_time = EXCLUDED.open_time,
                close_time = EXCLUDED.close_time,
                preparation_time = EXCLUDED.preparation_time,
                is_open = EXCLUDED.is_open,
                maintenance_mode = EXCLUDED.maintenance_mode,
                otp_verification = EXCLUDED.otp_verification
            RETURNING {SHOP_COLUMNS}
            "
        ))
        .bind(&settings.shop_name)
        .bind(&settings.phone)
        .bind(&settings.email)
        .bind(&settings.address)
        .bind(&settings.open_time)
        .bind(&settings.close_time)
        .bind(settings.preparation_time)
        .bind(settings.is_open)
        .bind(settings.maintenance_mode)
        .bind(settings.otp_verification)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Load store settings, inserting the defaults if the row is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn store(&self) -> Result<StoreSettings, RepositoryError> {
        let existing = sqlx::query_as::<_, StoreSettingsRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM cafe.store_settings WHERE id = 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some(row) => Ok(row.into()),
            None => {
                self.insert_store(&StoreSettings::default(), None, false)
                    .await
            }
        }
    }

    /// Write every store settings field.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_store(
        &self,
        settings: &StoreSettings,
        updated_by: Option<UserId>,
    ) -> Result<StoreSettings, RepositoryError> {
        self.insert_store(settings, updated_by, true).await
    }

    async fn insert_store(
        &self,
        settings: &StoreSettings,
        updated_by: Option<UserId>,
        overwrite: bool,
    ) -> Result<StoreSettings, RepositoryError> {
        // A concurrent first read may race us to create the row; then the
        // existing row wins and is returned unchanged.
        let conflict = if overwrite {
            r"DO UPDATE SET
                store_name = EXCLUDED.store_name,
                store_email = EXCLUDED.store_email,
                store_phone = EXCLUDED.store_phone,
                store_address = EXCLUDED.store_address,
                business_hours = EXCLUDED.business_hours,
                tax_rate = EXCLUDED.tax_rate,
                shipping_fee = EXCLUDED.shipping_fee,
                free_shipping_threshold = EXCLUDED.free_shipping_threshold,
                minimum_order_amount = EXCLUDED.minimum_order_amount,
                social_media = EXCLUDED.social_media,
                updated_by = EXCLUDED.updated_by"
        } else {
            "DO UPDATE SET id = cafe.store_settings.id"
        };

        let row = sqlx::query_as::<_, StoreSettingsRow>(&format!(
            r"
            INSERT INTO cafe.store_settings
                (id, store_name, store_email, store_phone, store_address, business_hours,
                 tax_rate, shipping_fee, free_shipping_threshold, minimum_order_amount,
                 social_media, updated_by)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) {conflict}
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(&settings.store_name)
        .bind(&settings.store_email)
        .bind(&settings.store_phone)
        .bind(Json(&settings.store_address))
        .bind(Json(&settings.business_hours))
        .bind(settings.tax_rate)
        .bind(settings.shipping_fee)
        .bind(settings.free_shipping_threshold)
        .bind(settings.minimum_order_amount)
        .bind(Json(&settings.social_media))
        .bind(updated_by.map(|id| id.as_i32()))
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }
}
