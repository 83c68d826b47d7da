//! Product catalog and review routes.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::{info, instrument};

use real_taste_core::{CategoryId, ProductId};

use super::{ApiResponse, counted, not_found};
use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{PageQuery, Pagination, Product, ProductInput, ProductSort, Review, ReviewInput};
use crate::state::AppState;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// `GET /api/products` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: i32,
}

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let sort = ProductSort::from_query(query.sort.as_deref());
    let (products, total) = ProductRepository::new(state.pool())
        .list(&page, sort)
        .await?;
    Ok(ApiResponse::data(products)
        .with_pagination(Pagination::new(&page, total))
        .json())
}

/// GET /api/products/featured
pub async fn featured(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductRepository::new(state.pool()).featured().await?;
    Ok(counted(products).json())
}

/// GET /api/products/category/{category_id}
pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = ProductRepository::new(state.pool())
        .by_category(category_id)
        .await?;
    Ok(counted(products).json())
}

/// GET /api/products/search?query=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let term = query.query.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide a search query".to_string(),
        ));
    }
    let products = ProductRepository::new(state.pool()).search(term).await?;
    Ok(counted(products).json())
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
    Ok(ApiResponse::data(product).json())
}

/// GET /api/products/{id}/reviews
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Vec<Review>>>> {
    let reviews = ReviewRepository::new(state.pool()).for_product(id).await?;
    Ok(counted(reviews).json())
}

/// POST /api/products/{id}/reviews
///
/// A second review from the same user replaces the first.
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn add_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Json(input): Json<ReviewInput>,
) -> Result<impl IntoResponse> {
    let input = input.validate()?;
    let review = ReviewRepository::new(state.pool())
        .upsert(id, user.id, &input)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    info!(product_id = %id, rating = review.rating, "Review saved");
    Ok(ApiResponse::data(review)
        .with_message("Review added successfully")
        .created())
}

/// POST /api/products
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    info!(product_id = %product.id, name = %product.name, "Product created");
    Ok(ApiResponse::data(product)
        .with_message("Product created successfully")
        .created())
}

/// PUT /api/products/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ApiResponse<Product>>> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    info!(product_id = %id, "Product updated");
    Ok(ApiResponse::data(product)
        .with_message("Product updated successfully")
        .json())
}

/// DELETE /api/products/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<()>>> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    info!(product_id = %id, "Product deleted");
    Ok(ApiResponse::message("Product removed successfully").json())
}

/// PUT /api/products/{id}/stock
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(update): Json<StockUpdate>,
) -> Result<Json<ApiResponse<Product>>> {
    if update.stock < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }
    let product = ProductRepository::new(state.pool())
        .set_stock(id, update.stock)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    info!(product_id = %id, stock = update.stock, "Stock updated");
    Ok(ApiResponse::data(product)
        .with_message("Stock updated successfully")
        .json())
}

/// PUT /api/products/{id}/availability
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn toggle_availability(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<Product>>> {
    let product = ProductRepository::new(state.pool())
        .toggle_availability(id)
        .await
        .map_err(not_found(PRODUCT_NOT_FOUND))?;

    let message = if product.is_available {
        "Product is now available"
    } else {
        "Product is now unavailable"
    };
    info!(product_id = %id, available = product.is_available, "Availability toggled");
    Ok(ApiResponse::data(product).with_message(message).json())
}
