//! Cart repository.
//!
//! A cart is the set of `cafe.cart_item` rows for one user.

use sqlx::{PgPool, Postgres, Transaction};

use real_taste_core::{Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: i32,
    name: String,
    price: Price,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity =
            u32::try_from(row.quantity).map_err(|e| RepositoryError::corrupt("cart quantity", e))?;
        Self::new(ProductId::new(row.product_id), row.name, row.price, quantity)
            .map_err(|e| RepositoryError::corrupt("cart line", e))
    }
}

/// Repository for shopping carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart, empty if they have no lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT product_id, name, price, quantity
            FROM cafe.cart_item
            WHERE user_id = $1
            ORDER BY added_at, product_id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(CartLine::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Cart::from_lines(lines).map_err(|e| RepositoryError::corrupt("cart total", e))
    }

    /// Insert a line, or set the quantity of an existing one.
    ///
    /// Name and price are refreshed from the caller so the line reflects
    /// the menu at the time of the last add.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        name: &str,
        price: Price,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cafe.cart_item (user_id, product_id, name, price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, product_id) DO UPDATE
            SET name = EXCLUDED.name, price = EXCLUDED.price, quantity = EXCLUDED.quantity
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(name)
        .bind(price)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove one product line. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cafe.cart_item WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        clear_in(&mut tx, user_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Empty a user's cart inside an existing transaction.
pub(crate) async fn clear_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cafe.cart_item WHERE user_id = $1")
        .bind(user_id.as_i32())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
