//! Menu category routes.

use axum::{extract::State, response::IntoResponse};
use tracing::{info, instrument};

use real_taste_core::CategoryId;

use super::{ApiResponse, counted};
use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryInput, CategoryNode, build_category_tree};
use crate::services::CategoryService;
use crate::state::AppState;

/// GET /api/categories
pub async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(counted(categories).json())
}

/// GET /api/categories/tree
pub async fn tree(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<CategoryNode>>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(ApiResponse::data(build_category_tree(&categories)).json())
}

/// GET /api/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(ApiResponse::data(category).json())
}

/// GET /api/categories/{id}/subcategories
pub async fn subcategories(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let children = CategoryRepository::new(state.pool()).children(id).await?;
    Ok(counted(children).json())
}

/// POST /api/categories
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<impl IntoResponse> {
    let category = CategoryService::new(state.pool())
        .create(input, Some(admin.id))
        .await?;

    info!(category_id = %category.id, slug = %category.slug, level = category.level, "Category created");
    Ok(ApiResponse::data(category)
        .with_message("Category created successfully")
        .created())
}

/// PUT /api/categories/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = CategoryService::new(state.pool())
        .update(id, input, Some(admin.id))
        .await?;

    info!(category_id = %id, slug = %category.slug, "Category updated");
    Ok(ApiResponse::data(category)
        .with_message("Category updated successfully")
        .json())
}

/// DELETE /api/categories/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<ApiResponse<()>>> {
    CategoryService::new(state.pool()).delete(id).await?;
    info!(category_id = %id, "Category deleted");
    Ok(ApiResponse::message("Category deleted successfully").json())
}
