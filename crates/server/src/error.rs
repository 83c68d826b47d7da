//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! The response body is always `{"success": false, "message": "..."}`.

use axum::{
    Json,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::{AuthError, CategoryError, ImportError, OrderError, OtpError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement or management failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Category management failed.
    #[error(transparent)]
    Category(#[from] CategoryError),

    /// OTP verification failed.
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Bulk import file was rejected.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Email delivery failed where the caller must know.
    #[error("{0}")]
    EmailDelivery(String),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Input failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// User is authenticated but lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// The shop is not taking requests right now.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The request body, path or query string could not be extracted.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Rate limited.
    #[error("Too many requests, please try again later")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound | RepositoryError::MissingReference(_))
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(_)
            | Self::EmailDelivery(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::IncorrectPassword => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(err) => match err {
                OrderError::Validation(_)
                | OrderError::InsufficientStock(_)
                | OrderError::BelowMinimum(_)
                | OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderError::ShopClosed => StatusCode::SERVICE_UNAVAILABLE,
                OrderError::VerificationRequired | OrderError::Forbidden => StatusCode::FORBIDDEN,
                OrderError::ProductNotFound | OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Category(err) => match err {
                CategoryError::Validation(_) | CategoryError::HasSubcategories => {
                    StatusCode::BAD_REQUEST
                }
                CategoryError::NotFound | CategoryError::ParentNotFound => StatusCode::NOT_FOUND,
                CategoryError::Conflict => StatusCode::CONFLICT,
                CategoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Otp(_) | Self::Import(_) | Self::Validation(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Rejected { status, .. } => *status,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        if let Self::EmailDelivery(message) = self {
            return message.clone();
        }
        if self.status() == StatusCode::INTERNAL_SERVER_ERROR {
            return "Server error".to_string();
        }

        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(
                RepositoryError::Conflict(msg) | RepositoryError::MissingReference(msg),
            ) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::IncorrectPassword => "Current password is incorrect".to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                AuthError::UserAlreadyExists => "Email already registered".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Please enter a valid email".to_string(),
                AuthError::Validation(err) => err.to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Order(err) => match err {
                OrderError::Validation(err) => err.to_string(),
                OrderError::ShopClosed => "Shop is currently closed".to_string(),
                OrderError::VerificationRequired => "Email verification required".to_string(),
                OrderError::ProductNotFound => "Product not found".to_string(),
                OrderError::InsufficientStock(name) => format!("Insufficient stock for {name}"),
                OrderError::BelowMinimum(minimum) => format!("Minimum order amount is {minimum}"),
                OrderError::NotFound => "Order not found".to_string(),
                OrderError::Forbidden => "Not authorized to view this order".to_string(),
                OrderError::InvalidTransition { from, to } => {
                    format!("Cannot change order status from {from} to {to}")
                }
                _ => "Server error".to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = json!({
            "success": false,
            "message": self.client_message(),
        });
        (status, Json(body)).into_response()
    }
}

macro_rules! from_rejection {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    Self::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

from_rejection!(JsonRejection, PathRejection, QueryRejection, MultipartRejection);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after login.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
