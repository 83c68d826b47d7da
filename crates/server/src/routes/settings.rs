//! Shop settings: public read, admin update.

use axum::extract::State;
use tracing::{info, instrument};

use super::ApiResponse;
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::models::{ShopSettings, ShopSettingsUpdate};
use crate::state::AppState;

/// GET /api/settings
pub async fn show(State(state): State<AppState>) -> Result<Json<ApiResponse<ShopSettings>>> {
    let settings = state.settings().shop(state.pool()).await?;
    Ok(ApiResponse::data(settings).json())
}

/// PUT /api/settings
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(update): Json<ShopSettingsUpdate>,
) -> Result<Json<ApiResponse<ShopSettings>>> {
    let cache = state.settings();
    let current = cache.shop(state.pool()).await?;
    let next = update.apply(&current)?;
    let saved = cache.save_shop(state.pool(), &next).await?;

    info!(
        is_open = saved.is_open,
        maintenance_mode = saved.maintenance_mode,
        otp_verification = saved.otp_verification,
        "Shop settings updated"
    );
    Ok(ApiResponse::data(saved)
        .with_message("Settings updated successfully")
        .json())
}
