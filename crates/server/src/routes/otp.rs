//! OTP routes for the checkout email gate.

use axum::extract::State;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use real_taste_core::Email;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::set_verified_otp;
use crate::models::VerifiedOtp;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::normalized(raw).map_err(|_| AppError::BadRequest("Please enter a valid email".to_string()))
}

/// POST /api/otp/send
///
/// Replaces any outstanding code for the address. If the email cannot be
/// delivered the new code is discarded so it can never be verified.
#[instrument(skip(state, req))]
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let raw = present(req.email.as_deref())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
    let email = parse_email(raw)?;

    let store = state.otp();
    let code = store.issue(&email).await;
    let ttl_minutes = store.ttl().as_secs().div_ceil(60);

    if let Err(e) = state
        .mailer()
        .send_otp(email.as_str(), &code, ttl_minutes)
        .await
    {
        store.discard(&email).await;
        error!(error = %e, "Failed to send OTP email");
        return Err(AppError::EmailDelivery("Failed to send OTP".to_string()));
    }

    info!("OTP sent");
    Ok(ApiResponse::message("OTP sent successfully").json())
}

/// POST /api/otp/verify
///
/// On success the session is marked as verified for this email, which is
/// what order placement checks.
#[instrument(skip(state, session, req))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<()>>> {
    let (Some(raw), Some(code)) = (present(req.email.as_deref()), present(req.otp.as_deref()))
    else {
        return Err(AppError::BadRequest(
            "Email and OTP are required".to_string(),
        ));
    };
    let email = parse_email(raw)?;

    state.otp().verify(&email, code).await?;
    set_verified_otp(&session, &VerifiedOtp::new(email)).await?;

    info!("OTP verified");
    Ok(ApiResponse::message("OTP verified successfully").json())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_present_trims_and_rejects_blank() {
        assert_eq!(present(Some("  123456 ")), Some("123456"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
    }

    #[test]
    fn test_parse_email_message() {
        let err = parse_email("not-an-email").unwrap_err();
        assert_eq!(err.client_message(), "Please enter a valid email");
    }
}
