//! CLI subcommands.

pub mod admin;
pub mod import;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command that needs the database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Neither database variable is set.
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Could not reach the database.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load `.env`, then connect using `API_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConnectError` if no URL is configured or the pool cannot connect.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(real_taste_server::db::create_pool(&database_url).await?)
}
