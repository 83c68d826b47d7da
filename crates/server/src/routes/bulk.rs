//! Bulk JSON import routes (admin).
//!
//! Uploads are `multipart/form-data` with the JSON array in a `file` field.

use axum::{
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::services::import::parse_array;
use crate::services::{ImportKind, ImportReport, ImportService};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// `{success, message, imported, errors}`
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    pub imported: usize,
    pub errors: Vec<String>,
}

impl ImportResponse {
    fn new(report: ImportReport, kind: ImportKind) -> Self {
        Self {
            success: true,
            message: report.message(kind),
            imported: report.imported,
            errors: report.errors,
        }
    }
}

/// Pull the uploaded file out of the form.
async fn read_upload(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Bytes> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if bytes.is_empty() {
                break;
            }
            return Ok(bytes);
        }
    }
    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// POST /api/bulk/products
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn import_products(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>> {
    let kind = ImportKind::Products;
    let items = parse_array(&read_upload(multipart).await?, kind)?;
    info!(rows = items.len(), "Importing products");

    let report = ImportService::new(state.pool()).import_products(items).await;
    Ok(Json(ImportResponse::new(report, kind)))
}

/// POST /api/bulk/categories
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn import_categories(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportResponse>> {
    let kind = ImportKind::Categories;
    let items = parse_array(&read_upload(multipart).await?, kind)?;
    info!(rows = items.len(), "Importing categories");

    let report = ImportService::new(state.pool())
        .import_categories(items, Some(admin.id))
        .await;
    Ok(Json(ImportResponse::new(report, kind)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let report = ImportReport {
            imported: 1,
            errors: vec!["Product 2: Category 'soups' not found".to_string()],
        };
        let body = serde_json::to_value(ImportResponse::new(report, ImportKind::Products)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": true,
                "message": "Imported 1 products successfully",
                "imported": 1,
                "errors": ["Product 2: Category 'soups' not found"],
            })
        );
    }
}
