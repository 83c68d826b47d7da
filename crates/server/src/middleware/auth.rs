//! Authentication extractors and session helpers.
//!
//! Provides extractors for requiring a logged-in user (or an admin) in route
//! handlers. Rejections use the same JSON error body as every other handler.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, VerifiedOtp, session_keys};

const NOT_LOGGED_IN: &str = "Not authorized, please log in";
const NOT_ADMIN: &str = "Not authorized as an admin";

/// Read the current user from the request's session, if any.
async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a logged-in user.
///
/// Rejects with 401 when the session has no user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.to_string()))
    }
}

/// Extractor that requires a logged-in admin.
///
/// Rejects with 401 when nobody is logged in and 403 for non-admin users.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.to_string()))?;
        if !user.is_admin() {
            return Err(AppError::Forbidden(NOT_ADMIN.to_string()));
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Replace the session copy of the user after a profile change.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn refresh_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

/// Record a successful OTP verification.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_verified_otp(
    session: &Session,
    marker: &VerifiedOtp,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::VERIFIED_OTP, marker).await
}

/// Read the OTP verification marker, if present.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn verified_otp(
    session: &Session,
) -> Result<Option<VerifiedOtp>, tower_sessions::session::Error> {
    session.get(session_keys::VERIFIED_OTP).await
}

/// Consume the OTP verification marker once an order has been placed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_verified_otp(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<VerifiedOtp>(session_keys::VERIFIED_OTP)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use real_taste_core::Email;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_verified_otp_is_consumed_once() {
        let session = session();
        assert!(verified_otp(&session).await.unwrap().is_none());

        let email = Email::parse("asha@example.com").unwrap();
        set_verified_otp(&session, &VerifiedOtp::new(email.clone()))
            .await
            .unwrap();
        let marker = verified_otp(&session).await.unwrap().unwrap();
        assert_eq!(marker.email, email);

        clear_verified_otp(&session).await.unwrap();
        assert!(verified_otp(&session).await.unwrap().is_none());
        clear_verified_otp(&session).await.unwrap();
    }
}
