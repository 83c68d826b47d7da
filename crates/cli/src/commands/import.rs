//! Bulk import commands.
//!
//! Reads the same JSON array files the `/api/bulk` endpoints accept and
//! applies them row by row. Rows that fail are reported and skipped.
//!
//! # Usage
//!
//! ```bash
//! real-taste-cli import categories menu/categories.json
//! real-taste-cli import products menu/products.json
//! ```

use std::path::Path;

use real_taste_server::services::{ImportKind, ImportReport, ImportService, import::parse_array};
use tracing::{info, warn};

use super::connect;

/// Import products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON array, or
/// the database is unreachable.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let items = read_items(file_path, ImportKind::Products).await?;
    let pool = connect().await?;
    let report = ImportService::new(&pool).import_products(items).await;
    print_summary(&report, ImportKind::Products);
    Ok(())
}

/// Import categories from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON array, or
/// the database is unreachable.
pub async fn categories(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let items = read_items(file_path, ImportKind::Categories).await?;
    let pool = connect().await?;
    let report = ImportService::new(&pool)
        .import_categories(items, None)
        .await;
    print_summary(&report, ImportKind::Categories);
    Ok(())
}

async fn read_items(
    file_path: &str,
    kind: ImportKind,
) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading import file");
    let bytes = tokio::fs::read(path).await?;
    let items = parse_array(&bytes, kind)?;
    info!(rows = items.len(), "Parsed import file");
    Ok(items)
}

fn print_summary(report: &ImportReport, kind: ImportKind) {
    info!("{}", report.message(kind));
    if !report.errors.is_empty() {
        warn!("  Errors: {}", report.errors.len());
        for err in &report.errors {
            warn!("    - {err}");
        }
    }
}
