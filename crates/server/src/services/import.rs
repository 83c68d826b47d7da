//! Bulk JSON import of products and categories.
//!
//! Used by `POST /api/bulk/*` and `real-taste-cli import`. The file must be
//! a JSON array; each element is validated and inserted on its own, so one
//! bad element is reported and skipped without affecting the others.

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use real_taste_core::{Price, UserId};

use super::catalog::CategoryService;
use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::category::CategoryInput;
use crate::models::product::ProductInput;

/// File-level import failures. Per-element failures go in [`ImportReport`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON format")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON file must contain an array of {0}")]
    NotAnArray(&'static str),
}

/// Outcome of an import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// What a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Products,
    Categories,
}

impl ImportKind {
    const fn plural(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Products => "Product",
            Self::Categories => "Category",
        }
    }
}

impl ImportReport {
    /// Summary line shown to the admin.
    #[must_use]
    pub fn message(&self, kind: ImportKind) -> String {
        format!("Imported {} {} successfully", self.imported, kind.plural())
    }

    fn record_error(&mut self, kind: ImportKind, index: usize, message: impl std::fmt::Display) {
        self.errors
            .push(format!("{} {}: {message}", kind.label(), index + 1));
    }
}

/// Parse an uploaded file into its array elements.
///
/// # Errors
///
/// Returns `ImportError::InvalidJson` for malformed JSON and
/// `ImportError::NotAnArray` when the top level is not an array.
pub fn parse_array(bytes: &[u8], kind: ImportKind) -> Result<Vec<Value>, ImportError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => Ok(items),
        _ => Err(ImportError::NotAnArray(kind.plural())),
    }
}

/// A product element of an import file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    name: String,
    description: String,
    price: Price,
    /// Category id, slug or name.
    category: Option<Value>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    stock: i32,
    #[serde(default = "default_true")]
    is_available: bool,
    #[serde(default)]
    featured: bool,
}

/// A category element of an import file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryRecord {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    /// Slug of an existing (or earlier in the file) category.
    #[serde(default)]
    parent: Option<String>,
}

const fn default_true() -> bool {
    true
}

/// Textual reference to a category from a JSON value.
fn category_reference(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Bulk importer.
pub struct ImportService<'a> {
    pool: &'a PgPool,
}

impl<'a> ImportService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Import product elements one by one.
    pub async fn import_products(&self, items: Vec<Value>) -> ImportReport {
        let kind = ImportKind::Products;
        let mut report = ImportReport::default();
        for (index, item) in items.into_iter().enumerate() {
            match self.import_product(item).await {
                Ok(()) => report.imported += 1,
                Err(message) => report.record_error(kind, index, message),
            }
        }
        info!(imported = report.imported, failed = report.errors.len(), "Product import finished");
        report
    }

    async fn import_product(&self, item: Value) -> Result<(), String> {
        let record: ProductRecord = serde_json::from_value(item).map_err(|e| e.to_string())?;

        let reference = record
            .category
            .as_ref()
            .and_then(category_reference)
            .ok_or_else(|| "Category is required".to_owned())?;
        let category = CategoryRepository::new(self.pool)
            .find_by_reference(&reference)
            .await
            .map_err(|e| database_message(&e))?
            .ok_or_else(|| format!("Category '{reference}' not found"))?;

        let input = ProductInput {
            name: record.name,
            description: record.description,
            price: record.price,
            category_id: Some(category.id),
            image: record.image,
            images: record.images,
            stock: record.stock,
            is_available: record.is_available,
            featured: record.featured,
        }
        .validate()
        .map_err(|e| e.to_string())?;

        ProductRepository::new(self.pool)
            .create(&input)
            .await
            .map_err(|e| database_message(&e))?;
        Ok(())
    }

    /// Import category elements in file order, so parents defined earlier
    /// in the same file resolve.
    pub async fn import_categories(
        &self,
        items: Vec<Value>,
        created_by: Option<UserId>,
    ) -> ImportReport {
        let kind = ImportKind::Categories;
        let mut report = ImportReport::default();
        for (index, item) in items.into_iter().enumerate() {
            match self.import_category(item, created_by).await {
                Ok(()) => report.imported += 1,
                Err(message) => report.record_error(kind, index, message),
            }
        }
        info!(imported = report.imported, failed = report.errors.len(), "Category import finished");
        report
    }

    async fn import_category(&self, item: Value, created_by: Option<UserId>) -> Result<(), String> {
        let record: CategoryRecord = serde_json::from_value(item).map_err(|e| e.to_string())?;

        let parent_id = match record.parent.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => Some(
                CategoryRepository::new(self.pool)
                    .get_by_slug(slug)
                    .await
                    .map_err(|e| database_message(&e))?
                    .ok_or_else(|| format!("Parent category '{slug}' not found"))?
                    .id,
            ),
            _ => None,
        };

        let input = CategoryInput {
            name: record.name,
            description: record.description,
            image: record.image,
            parent_id,
            is_active: record.is_active,
        };
        CategoryService::new(self.pool)
            .create(input, created_by)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Client-safe text for a repository failure inside an import row.
fn database_message(e: &RepositoryError) -> String {
    tracing::warn!(error = %e, "Import row failed");
    match e {
        RepositoryError::Conflict(message) | RepositoryError::MissingReference(message) => {
            message.clone()
        }
        _ => "Database error".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let items = parse_array(br#"[{"name":"Chai"},{"name":"Lassi"}]"#, ImportKind::Products)
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_array(b"[{", ImportKind::Products).unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON format");
    }

    #[test]
    fn test_parse_rejects_object() {
        let err = parse_array(br#"{"name":"Chai"}"#, ImportKind::Categories).unwrap_err();
        assert_eq!(err.to_string(), "JSON file must contain an array of categories");
    }

    #[test]
    fn test_report_messages() {
        let mut report = ImportReport::default();
        report.imported = 2;
        report.record_error(ImportKind::Products, 2, "Stock cannot be negative");
        assert_eq!(report.message(ImportKind::Products), "Imported 2 products successfully");
        assert_eq!(report.errors, ["Product 3: Stock cannot be negative"]);
    }

    #[test]
    fn test_product_record_defaults() {
        let record: ProductRecord = serde_json::from_value(serde_json::json!({
            "name": "Samosa",
            "description": "Crisp pastry with spiced potato",
            "price": 20,
            "category": "snacks",
        }))
        .unwrap();
        assert!(record.is_available);
        assert_eq!(record.stock, 0);
        assert_eq!(
            record.category.as_ref().and_then(category_reference).as_deref(),
            Some("snacks")
        );
    }

    #[test]
    fn test_category_reference_from_number() {
        assert_eq!(category_reference(&serde_json::json!(7)).as_deref(), Some("7"));
        assert_eq!(category_reference(&serde_json::json!("  ")), None);
        assert_eq!(category_reference(&serde_json::json!(null)), None);
    }
}
