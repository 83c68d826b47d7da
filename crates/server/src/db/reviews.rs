//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use real_taste_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::product::{Review, ReviewInput};

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    user_name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            user_name: row.user_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews for a product with reviewer names, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.name AS user_name,
                   r.rating, r.comment, r.created_at, r.updated_at
            FROM cafe.review r
            JOIN cafe.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Add or replace the user's review of a product.
    ///
    /// The product's `rating` and `num_reviews` are recomputed in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn upsert(
        &self,
        product_id: ProductId,
        user_id: UserId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM cafe.product WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id.as_i32())
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let review_id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO cafe.review (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, user_id) DO UPDATE
            SET rating = EXCLUDED.rating, comment = EXCLUDED.comment
            RETURNING id
            ",
        )
        .bind(product_id.as_i32())
        .bind(user_id.as_i32())
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE cafe.product p
            SET rating = COALESCE(s.avg_rating, 0), num_reviews = s.review_count
            FROM (
                SELECT ROUND(AVG(rating)::numeric, 2) AS avg_rating, COUNT(*)::int AS review_count
                FROM cafe.review WHERE product_id = $1
            ) s
            WHERE p.id = $1
            ",
        )
        .bind(product_id.as_i32())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.name AS user_name,
                   r.rating, r.comment, r.created_at, r.updated_at
            FROM cafe.review r
            JOIN cafe.user u ON u.id = r.user_id
            WHERE r.id = $1
            ",
        )
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
