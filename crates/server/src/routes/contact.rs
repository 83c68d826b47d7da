//! Contact form submission and admin triage.

use axum::{extract::State, response::IntoResponse};
use tracing::{info, instrument, warn};

use real_taste_core::ContactMessageId;

use super::{ApiResponse, counted, not_found};
use crate::db::ContactRepository;
use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::{ContactForm, ContactMessage, ContactStatusUpdate, NewContactMessage};
use crate::state::AppState;

/// Email the admin and acknowledge the sender without delaying the response.
fn notify(state: &AppState, message: NewContactMessage) {
    let mailer = state.mailer().clone();
    let admin_email = state.config().admin_notification_email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_contact_admin(&admin_email, &message).await {
            warn!(error = %e, "Failed to send contact notification");
        }
        if let Err(e) = mailer.send_contact_ack(&message).await {
            warn!(error = %e, "Failed to send contact acknowledgement");
        }
    });
}

/// POST /api/contact
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<impl IntoResponse> {
    let message = form.validate()?;
    let stored = ContactRepository::new(state.pool()).create(&message).await?;
    info!(message_id = %stored.id, "Contact message received");

    notify(&state, message);
    Ok(ApiResponse::data(stored)
        .with_message("Message sent successfully! We will get back to you soon.")
        .created())
}

/// GET /api/contact
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<ContactMessage>>>> {
    let messages = ContactRepository::new(state.pool()).list().await?;
    Ok(counted(messages).json())
}

/// PUT /api/contact/{id}/status
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
    Json(update): Json<ContactStatusUpdate>,
) -> Result<Json<ApiResponse<ContactMessage>>> {
    let message = ContactRepository::new(state.pool())
        .set_status(id, update.status)
        .await
        .map_err(not_found("Message not found"))?;
    Ok(ApiResponse::data(message)
        .with_message("Message status updated")
        .json())
}
