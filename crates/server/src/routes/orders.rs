//! Order routes: checkout for customers, lifecycle management for admins.

use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::{instrument, warn};

use real_taste_core::OrderId;

use super::{ApiResponse, counted};
use crate::db::OrderRepository;
use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::{RequireAdmin, RequireAuth, clear_verified_otp, verified_otp};
use crate::models::{CreateOrderRequest, Order, OrderStats, PaymentResult, PaymentUpdate, StatusUpdate};
use crate::services::OrderService;
use crate::state::AppState;

fn order_service(state: &AppState) -> OrderService<'_> {
    OrderService::new(
        state.pool(),
        state.settings(),
        state.mailer(),
        &state.config().admin_notification_email,
    )
}

/// POST /api/orders
///
/// The session's OTP verification is consumed once the order exists.
#[instrument(skip(state, session, user, req), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let marker = verified_otp(&session).await?;
    let order = order_service(&state)
        .place(&user, req, marker.as_ref())
        .await?;

    if marker.is_some()
        && let Err(e) = clear_verified_otp(&session).await
    {
        warn!(order_id = %order.id, error = %e, "Failed to clear OTP verification");
    }

    Ok(ApiResponse::data(order)
        .with_message("Order created successfully")
        .created())
}

/// GET /api/orders/my-orders
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool()).for_user(user.id).await?;
    Ok(counted(orders).json())
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = order_service(&state).get_for(&user, id).await?;
    Ok(ApiResponse::data(order).json())
}

/// GET /api/orders/all
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(counted(orders).json())
}

/// GET /api/orders/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<OrderStats>>> {
    let stats = OrderRepository::new(state.pool()).stats().await?;
    Ok(ApiResponse::data(stats).json())
}

/// PUT /api/orders/{id}/status
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = order_service(&state)
        .update_status(id, update.status)
        .await?;
    Ok(ApiResponse::data(order)
        .with_message("Order status updated")
        .json())
}

/// PUT /api/orders/{id}/pay
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn mark_paid(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(update): Json<PaymentUpdate>,
) -> Result<Json<ApiResponse<Order>>> {
    let result = PaymentResult::from(update);
    let order = order_service(&state).mark_paid(id, &result).await?;
    Ok(ApiResponse::data(order)
        .with_message("Order marked as paid")
        .json())
}
