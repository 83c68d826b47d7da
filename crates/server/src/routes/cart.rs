//! Shopping cart routes. Every route requires a logged-in user.

use axum::extract::State;
use tracing::{debug, instrument};

use real_taste_core::ProductId;

use super::ApiResponse;
use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::{AddToCart, Cart};
use crate::state::AppState;

/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ApiResponse<Cart>>> {
    let cart = CartRepository::new(state.pool()).get(user.id).await?;
    Ok(ApiResponse::data(cart).json())
}

/// POST /api/cart/add
///
/// Sets the line to exactly `quantity`; it does not add to an existing line.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddToCart>,
) -> Result<Json<ApiResponse<Cart>>> {
    if req.quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .get(req.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.is_available {
        return Err(AppError::BadRequest("Product is not available".to_string()));
    }
    let quantity = i32::try_from(req.quantity)
        .ok()
        .filter(|q| *q <= product.stock)
        .ok_or_else(|| AppError::BadRequest("Insufficient stock".to_string()))?;

    let carts = CartRepository::new(state.pool());
    carts
        .set_line(user.id, product.id, &product.name, product.price, quantity)
        .await?;
    debug!(product_id = %product.id, quantity, "Cart line set");

    let cart = carts.get(user.id).await?;
    Ok(ApiResponse::data(cart)
        .with_message("Item added to cart")
        .json())
}

/// DELETE /api/cart/items/{product_id}
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<Cart>>> {
    let carts = CartRepository::new(state.pool());
    carts.remove_line(user.id, product_id).await?;
    let cart = carts.get(user.id).await?;
    Ok(ApiResponse::data(cart)
        .with_message("Item removed from cart")
        .json())
}

/// DELETE /api/cart/clear
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ApiResponse<Cart>>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(ApiResponse::data(Cart::default())
        .with_message("Cart cleared")
        .json())
}
