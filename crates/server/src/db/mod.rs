//! Database operations for the café `PostgreSQL` database.
//!
//! ## Tables (schema `cafe`)
//!
//! - `user`, `user_password` - Accounts and argon2 password hashes
//! - `category` - Menu category tree (`parent_id`, materialized `path`)
//! - `product`, `review` - Menu items and customer reviews
//! - `cart_item` - One cart per user, one row per product line
//! - `order`, `order_item` - Placed takeaway orders
//! - `shop_settings`, `store_settings` - Singleton configuration rows
//! - `contact_message` - Contact form submissions
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p real-taste-cli -- migrate
//! ```

pub mod carts;
pub mod categories;
pub mod contact;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use contact::ContactRepository;
pub use orders::{OrderRepository, PlaceOrderError, StatusChangeError};
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row (e.g., a product's category) does not exist.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }

    /// Map a foreign-key violation to `MissingReference`, anything else to `Database`.
    pub(crate) fn foreign_key_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::MissingReference(message.to_owned());
        }
        Self::Database(e)
    }

    pub(crate) fn corrupt(what: &str, e: impl std::fmt::Display) -> Self {
        Self::DataCorruption(format!("invalid {what} in database: {e}"))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
