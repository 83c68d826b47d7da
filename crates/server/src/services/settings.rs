//! Cached access to shop and store settings.
//!
//! Settings are read on every order and every settings page load, so both
//! singletons are cached for a minute. Writes go straight to the database
//! and invalidate the cached copy.

use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use real_taste_core::UserId;

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::settings::{ShopSettings, StoreSettings};

const SETTINGS_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SettingsKey {
    Shop,
    Store,
}

#[derive(Debug, Clone)]
enum CachedSettings {
    Shop(ShopSettings),
    Store(Box<StoreSettings>),
}

/// Read-through cache over [`SettingsRepository`].
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<SettingsKey, CachedSettings>,
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(2)
                .time_to_live(SETTINGS_TTL)
                .build(),
        }
    }

    /// Current shop settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings cannot be loaded.
    pub async fn shop(&self, pool: &PgPool) -> Result<ShopSettings, RepositoryError> {
        if let Some(CachedSettings::Shop(settings)) = self.cache.get(&SettingsKey::Shop).await {
            debug!("Cache hit for shop settings");
            return Ok(settings);
        }
        let settings = SettingsRepository::new(pool).shop().await?;
        self.cache
            .insert(SettingsKey::Shop, CachedSettings::Shop(settings.clone()))
            .await;
        Ok(settings)
    }

    /// Persist shop settings and refresh the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn save_shop(
        &self,
        pool: &PgPool,
        settings: &ShopSettings,
    ) -> Result<ShopSettings, RepositoryError> {
        let saved = SettingsRepository::new(pool).save_shop(settings).await;
        self.cache.invalidate(&SettingsKey::Shop).await;
        saved
    }

    /// Current store settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the settings cannot be loaded.
    pub async fn store(&self, pool: &PgPool) -> Result<StoreSettings, RepositoryError> {
        if let Some(CachedSettings::Store(settings)) = self.cache.get(&SettingsKey::Store).await {
            debug!("Cache hit for store settings");
            return Ok(*settings);
        }
        let settings = SettingsRepository::new(pool).store().await?;
        self.cache
            .insert(
                SettingsKey::Store,
                CachedSettings::Store(Box::new(settings.clone())),
            )
            .await;
        Ok(settings)
    }

    /// Persist store settings and refresh the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn save_store(
        &self,
        pool: &PgPool,
        settings: &StoreSettings,
        updated_by: Option<UserId>,
    ) -> Result<StoreSettings, RepositoryError> {
        let saved = SettingsRepository::new(pool)
            .save_store(settings, updated_by)
            .await;
        self.cache.invalidate(&SettingsKey::Store).await;
        saved
    }
}
