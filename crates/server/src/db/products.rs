//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use real_taste_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::PageQuery;
use crate::models::product::{Product, ProductInput, ProductSort, like_pattern};

const CATEGORY_NOT_FOUND: &str = "Category not found";

const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id, image, images, stock, \
     is_available, featured, rating, num_reviews, created_at, updated_at";

/// Maximum number of featured products returned.
const FEATURED_LIMIT: i64 = 10;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Price,
    category_id: Option<i32>,
    image: Option<String>,
    images: Vec<String>,
    stock: i32,
    is_available: bool,
    featured: bool,
    rating: Decimal,
    num_reviews: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id.map(CategoryId::new),
            image: row.image,
            images: row.images,
            stock: row.stock,
            is_available: row.is_available,
            featured: row.featured,
            rating: row.rating,
            num_reviews: row.num_reviews,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn into_products(rows: Vec<ProductRow>) -> Vec<Product> {
    rows.into_iter().map(Product::from).collect()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        page: &PageQuery,
        sort: ProductSort,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        // ORDER BY comes from a fixed set of clauses, never from input.
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM cafe.product ORDER BY {} LIMIT $1 OFFSET $2",
            sort.order_by()
        ))
        .bind(i64::from(page.limit()))
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cafe.product")
            .fetch_one(self.pool)
            .await?;

        Ok((into_products(rows), total))
    }

    /// Featured products that are currently available.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM cafe.product
            WHERE featured AND is_available
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "
        ))
        .bind(FEATURED_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(into_products(rows))
    }

    /// Products in a category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_category(&self, id: CategoryId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM cafe.product WHERE category_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;
        Ok(into_products(rows))
    }

    /// Case-insensitive substring search over name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM cafe.product
            WHERE name ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\'
            ORDER BY name, id
            "
        ))
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?;
        Ok(into_products(rows))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM cafe.product WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    /// Insert a product from validated input.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingReference` for an unknown category id,
    /// `RepositoryError::Database` if the insert otherwise fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO cafe.product
                (name, description, price, category_id, image, images, stock, is_available, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id.map(|id| id.as_i32()))
        .bind(input.image.as_deref())
        .bind(&input.images)
        .bind(input.stock)
        .bind(input.is_available)
        .bind(input.featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::foreign_key_violation(e, CATEGORY_NOT_FOUND))?;
        Ok(row.into())
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist, or
    /// `RepositoryError::MissingReference` for an unknown category id.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE cafe.product
            SET name = $2, description = $3, price = $4, category_id = $5, image = $6,
                images = $7, stock = $8, is_available = $9, featured = $10
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id.map(|id| id.as_i32()))
        .bind(input.image.as_deref())
        .bind(&input.images)
        .bind(input.stock)
        .bind(input.is_available)
        .bind(input.featured)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::foreign_key_violation(e, CATEGORY_NOT_FOUND))?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cafe.product WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set the stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE cafe.product SET stock = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(stock)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Flip `is_available`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn toggle_availability(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE cafe.product SET is_available = NOT is_available WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        Ok(row.into())
    }

    /// Number of products, used by seeding.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cafe.product")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
