//! Menu product and review models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use real_taste_core::{CategoryId, Price, ProductId, ReviewId, UserId};

use super::{ValidationError, check_max_len, require_text};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_COMMENT_LENGTH: usize = 500;

/// A menu item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category_id: Option<CategoryId>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_available: bool,
    pub featured: bool,
    /// Average review rating, 0 when there are no reviews.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin create/update payload for a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub featured: bool,
}

const fn default_true() -> bool {
    true
}

impl ProductInput {
    /// Trim text fields and check every length and range rule.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` encountered.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.name = require_text(&self.name, "Product name", MAX_NAME_LENGTH)?;
        self.description =
            require_text(&self.description, "Product description", MAX_DESCRIPTION_LENGTH)?;
        if self.stock < 0 {
            return Err(ValidationError::new("Stock cannot be negative"));
        }
        self.image = self
            .image
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self.images.retain(|s| !s.trim().is_empty());
        Ok(self)
    }
}

/// Sort order for the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    TopRated,
}

impl ProductSort {
    /// Parse the `sort` query value; unknown values fall back to newest first.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("createdAt") => Self::Oldest,
            Some("price") => Self::PriceAsc,
            Some("-price") => Self::PriceDesc,
            Some("name") => Self::NameAsc,
            Some("-name") => Self::NameDesc,
            Some("-rating") => Self::TopRated,
            _ => Self::Newest,
        }
    }

    /// SQL `ORDER BY` clause. Always ends with `id` so paging is stable.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "created_at DESC, id DESC",
            Self::Oldest => "created_at ASC, id ASC",
            Self::PriceAsc => "price ASC, id ASC",
            Self::PriceDesc => "price DESC, id DESC",
            Self::NameAsc => "name ASC, id ASC",
            Self::NameDesc => "name DESC, id DESC",
            Self::TopRated => "rating DESC, num_reviews DESC, id DESC",
        }
    }
}

/// A customer review with the reviewer's display name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review submission payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

impl ReviewInput {
    /// # Errors
    ///
    /// Returns `ValidationError` if the rating is outside 1..=5 or the
    /// comment is too long.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::new("Rating must be between 1 and 5"));
        }
        self.comment = self.comment.trim().to_owned();
        check_max_len(&self.comment, "Comment", MAX_COMMENT_LENGTH)?;
        Ok(self)
    }
}

/// Escape `%`, `_` and `\` so a search term matches literally in `ILIKE`.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
