//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin, or promote an existing customer account
//! real-taste-cli admin create -e owner@realtastecafe.com -n "Owner" -p "s3cret-pass"
//!
//! # Password from the environment instead of the command line
//! ADMIN_PASSWORD=s3cret-pass real-taste-cli admin create -e owner@realtastecafe.com -n "Owner"
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_PASSWORD` - Password used when `-p` is not given

use real_taste_core::{Email, UserId, UserRole};
use real_taste_server::db::{RepositoryError, UserRepository};
use real_taste_server::services::AuthService;
use real_taste_server::services::auth::{AuthError, ProfileChanges};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// A new account needs a password.
    #[error("A password is required for a new admin (use -p or ADMIN_PASSWORD)")]
    MissingPassword,

    #[error("Account error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// Create an admin account, or promote the account that already uses `email`.
///
/// For an existing account the password is only replaced when one is given.
///
/// # Returns
///
/// The ID of the admin user.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid, a new account has no
/// password, or any database operation fails.
pub async fn create_user(
    email: &str,
    name: &str,
    password: Option<&str>,
) -> Result<UserId, AdminError> {
    let email =
        Email::normalized(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let password = password
        .map(ToOwned::to_owned)
        .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
        .filter(|p| !p.is_empty());

    let pool = connect().await?;
    let auth = AuthService::new(&pool);

    if let Some(existing) = UserRepository::new(&pool).get_by_email(&email).await? {
        tracing::info!("Promoting existing user: {} ({})", email, existing.role);
        let user = auth
            .update_profile(
                existing.id,
                ProfileChanges {
                    name: Some(name),
                    email: None,
                    role: Some(UserRole::Admin),
                },
            )
            .await?;
        if let Some(password) = password.as_deref() {
            auth.set_password(user.id, password).await?;
            tracing::info!("Password replaced");
        }
        tracing::info!("User {} is now an admin (ID: {})", user.email, user.id);
        return Ok(user.id);
    }

    let password = password.ok_or(AdminError::MissingPassword)?;
    tracing::info!("Creating admin user: {}", email);
    let user = auth
        .create_account(name, email.as_str(), &password, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id)
}
