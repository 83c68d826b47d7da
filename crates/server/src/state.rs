//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{Mailer, OtpStore, SettingsCache};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    mailer: Mailer,
    otp: OtpStore,
    settings: SettingsCache,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool, mailer: Mailer) -> Self {
        let otp = OtpStore::new(config.otp_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                otp,
                settings: SettingsCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Outstanding OTP codes.
    #[must_use]
    pub fn otp(&self) -> &OtpStore {
        &self.inner.otp
    }

    /// Cached shop and store settings.
    #[must_use]
    pub fn settings(&self) -> &SettingsCache {
        &self.inner.settings
    }
}
