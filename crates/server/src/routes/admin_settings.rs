//! Back-office store profile, business hours and pricing.
//!
//! All routes require an admin. Each write re-reads the current settings,
//! applies the change and stores the whole record.

use axum::extract::State;
use tracing::{info, instrument};

use super::ApiResponse;
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::models::settings::validate_business_hours;
use crate::models::{BusinessHoursUpdate, CurrentUser, PricingUpdate, StoreSettings, StoreSettingsUpdate};
use crate::state::AppState;

async fn save(
    state: &AppState,
    admin: &CurrentUser,
    settings: &StoreSettings,
) -> Result<StoreSettings> {
    Ok(state
        .settings()
        .save_store(state.pool(), settings, Some(admin.id))
        .await?)
}

/// GET /api/admin/settings
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<StoreSettings>>> {
    let settings = state.settings().store(state.pool()).await?;
    Ok(ApiResponse::data(settings).json())
}

/// PUT /api/admin/settings
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(update): Json<StoreSettingsUpdate>,
) -> Result<Json<ApiResponse<StoreSettings>>> {
    let current = state.settings().store(state.pool()).await?;
    let saved = save(&state, &admin, &update.apply(&current)?).await?;

    info!("Store settings updated");
    Ok(ApiResponse::data(saved)
        .with_message("Settings updated successfully")
        .json())
}

/// PUT /api/admin/settings/business-hours
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update_business_hours(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(update): Json<BusinessHoursUpdate>,
) -> Result<Json<ApiResponse<StoreSettings>>> {
    validate_business_hours(&update.business_hours)?;

    let mut next = state.settings().store(state.pool()).await?;
    next.business_hours = update.business_hours;
    let saved = save(&state, &admin, &next).await?;

    info!(days = saved.business_hours.len(), "Business hours updated");
    Ok(ApiResponse::data(saved)
        .with_message("Business hours updated successfully")
        .json())
}

/// PUT /api/admin/settings/pricing
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update_pricing(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(update): Json<PricingUpdate>,
) -> Result<Json<ApiResponse<StoreSettings>>> {
    let pricing = update.validate()?;

    let mut next = state.settings().store(state.pool()).await?;
    next.tax_rate = pricing.tax_rate;
    next.shipping_fee = pricing.shipping_fee;
    next.free_shipping_threshold = pricing.free_shipping_threshold;
    next.minimum_order_amount = pricing.minimum_order_amount;
    let saved = save(&state, &admin, &next).await?;

    info!(
        minimum_order_amount = %saved.minimum_order_amount,
        tax_rate = %saved.tax_rate,
        "Pricing updated"
    );
    Ok(ApiResponse::data(saved)
        .with_message("Pricing settings updated successfully")
        .json())
}
