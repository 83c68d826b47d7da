//! Order repository.
//!
//! Placing an order and cancelling one both touch product stock, and each
//! runs in a single transaction so stock and orders never disagree.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use real_taste_core::{
    Email, MobileNumber, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Price,
    PriceError, ProductId, UserId,
};

use super::{RepositoryError, carts};
use crate::models::order::{
    DailyOrders, NewOrder, Order, OrderCustomer, OrderItem, OrderStats, PaymentResult,
};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.total_amount, o.status, o.payment_status, \
     o.payment_method, o.mobile_number, o.special_instructions, o.is_paid, o.paid_at, \
     o.payment_result, o.created_at, o.updated_at";

/// Largest total `cafe.order.total_amount` can hold.
fn max_order_total() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Reject totals the orders table cannot store.
fn check_total(total: Price) -> Result<Price, PlaceOrderError> {
    if total.amount() > max_order_total() {
        return Err(PlaceOrderError::TotalTooLarge(total));
    }
    Ok(total)
}

/// Number of days reported in order statistics.
const STATS_DAYS: i64 = 7;

/// Why an order could not be placed. Nothing is written in any of these cases.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The product is unavailable or has too little stock.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("order total is below the minimum of {0}")]
    BelowMinimum(Price),

    #[error("order total overflow")]
    Overflow(#[from] PriceError),

    /// The total does not fit the stored `NUMERIC(10, 2)` column.
    #[error("order total {0} is too large")]
    TotalTooLarge(Price),

    #[error("quantity for product {0} is too large")]
    QuantityTooLarge(ProductId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Why an order's status could not be changed.
#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("order not found")]
    NotFound,

    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for StatusChangeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    total_amount: Price,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    mobile_number: String,
    special_instructions: Option<String>,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_result: Option<Json<PaymentResult>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(
        self,
        items: Vec<OrderItem>,
        customer: Option<OrderCustomer>,
    ) -> Result<Order, RepositoryError> {
        let mobile_number = MobileNumber::parse(&self.mobile_number)
            .map_err(|e| RepositoryError::corrupt("mobile number", e))?;
        let id = OrderId::new(self.id);
        Ok(Order {
            id,
            reference: id.reference(),
            user_id: UserId::new(self.user_id),
            customer,
            items,
            total_amount: self.total_amount,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            mobile_number,
            special_instructions: self.special_instructions.unwrap_or_default(),
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            payment_result: self.payment_result.map(|Json(result)| result),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderWithCustomerRow {
    #[sqlx(flatten)]
    order: OrderRow,
    customer_name: String,
    customer_email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    name: String,
    quantity: i32,
    price: Price,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            name: row.name,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReservedLine {
    name: String,
    price: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct DailyRow {
    date: NaiveDate,
    orders: i64,
    sales: Price,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Within one transaction: decrement stock for every line with a
    /// conditional update, price the lines from the database, enforce the
    /// minimum order amount (zero disables it), insert the order and its
    /// items, and clear the user's cart. Products are locked in id order.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError` if a product is missing or short on stock,
    /// the total is below `minimum`, or the database fails. The transaction
    /// is rolled back in every error case.
    pub async fn place(
        &self,
        user_id: UserId,
        order: &NewOrder,
        minimum: Price,
    ) -> Result<Order, PlaceOrderError> {
        let mut lines = order.lines.clone();
        lines.sort_by_key(|line| line.product_id);

        let mut tx = self.pool.begin().await?;
        let mut priced = Vec::with_capacity(lines.len());
        let mut total = Price::zero();

        for line in &lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| PlaceOrderError::QuantityTooLarge(line.product_id))?;
            let reserved = reserve_stock(&mut tx, line.product_id, quantity).await?;
            total = total.checked_add(reserved.price.times(line.quantity)?)?;
            priced.push((line.product_id, reserved, quantity));
        }

        let total = check_total(total)?;
        if !minimum.is_zero() && total < minimum {
            return Err(PlaceOrderError::BelowMinimum(minimum));
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO cafe.order AS o
                (user_id, total_amount, payment_method, mobile_number, special_instructions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id.as_i32())
        .bind(total)
        .bind(order.payment_method)
        .bind(order.mobile_number.as_str())
        .bind(&order.special_instructions)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.len());
        for (product_id, reserved, quantity) in priced {
            let item = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO cafe.order_item (order_id, product_id, name, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, order_id, product_id, name, quantity, price
                ",
            )
            .bind(row.id)
            .bind(product_id.as_i32())
            .bind(&reserved.name)
            .bind(quantity)
            .bind(reserved.price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(item));
        }

        carts::clear_in(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(row.into_order(items, None)?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS customer_name, u.email AS customer_email
            FROM cafe.order o
            JOIN cafe.user u ON u.id = o.user_id
            WHERE o.id = $1
            "
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_customers(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM cafe.order o WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines, None)
            })
            .collect()
    }

    /// Every order with its customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderWithCustomerRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS customer_name, u.email AS customer_email
            FROM cafe.order o
            JOIN cafe.user u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;
        self.attach_customers(rows).await
    }

    async fn attach_customers(
        &self,
        rows: Vec<OrderWithCustomerRow>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.order.id).collect();
        let mut items = self.items_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let email = Email::parse(&row.customer_email)
                    .map_err(|e| RepositoryError::corrupt("email", e))?;
                let customer = OrderCustomer {
                    name: row.customer_name,
                    email,
                };
                let lines = items.remove(&row.order.id).unwrap_or_default();
                row.order.into_order(lines, Some(customer))
            })
            .collect()
    }

    async fn items_for(&self, order_ids: &[i32]) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, name, quantity, price
            FROM cafe.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Move an order to `next`, validating the transition.
    ///
    /// Cancelling returns each line's quantity to product stock in the same
    /// transaction. Returns the status the order had before the change.
    ///
    /// # Errors
    ///
    /// Returns `StatusChangeError::NotFound` for an unknown order and
    /// `StatusChangeError::InvalidTransition` for a disallowed move.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderStatus, StatusChangeError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM cafe.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StatusChangeError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(StatusChangeError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        if next == OrderStatus::Cancelled && current != OrderStatus::Cancelled {
            restore_stock(&mut tx, id).await?;
        }

        sqlx::query("UPDATE cafe.order SET status = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(current)
    }

    /// Record a completed payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        result: &PaymentResult,
    ) -> Result<(), RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE cafe.order
            SET is_paid = TRUE, paid_at = NOW(), payment_status = 'completed', payment_result = $2
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(Json(result))
        .execute(self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Totals and the most recent days with orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let (total_orders, total_sales) = sqlx::query_as::<_, (i64, Price)>(
            r"
            SELECT COUNT(*),
                   COALESCE(SUM(total_amount) FILTER (WHERE status <> 'cancelled'), 0)
            FROM cafe.order
            ",
        )
        .fetch_one(self.pool)
        .await?;

        let daily = sqlx::query_as::<_, DailyRow>(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS date,
                   COUNT(*) AS orders,
                   COALESCE(SUM(total_amount) FILTER (WHERE status <> 'cancelled'), 0) AS sales
            FROM cafe.order
            GROUP BY 1
            ORDER BY 1 DESC
            LIMIT $1
            ",
        )
        .bind(STATS_DAYS)
        .fetch_all(self.pool)
        .await?;

        Ok(OrderStats {
            total_orders,
            total_sales,
            daily_orders: daily
                .into_iter()
                .map(|row| DailyOrders {
                    date: row.date,
                    orders: row.orders,
                    sales: row.sales,
                })
                .collect(),
        })
    }
}

/// Take `quantity` units of a product, failing if it is missing,
/// unavailable or short on stock.
async fn reserve_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    quantity: i32,
) -> Result<ReservedLine, PlaceOrderError> {
    let reserved = sqlx::query_as::<_, ReservedLine>(
        r"
        UPDATE cafe.product
        SET stock = stock - $2
        WHERE id = $1 AND is_available AND stock >= $2
        RETURNING name, price
        ",
    )
    .bind(product_id.as_i32())
    .bind(quantity)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(line) = reserved {
        return Ok(line);
    }

    let name = sqlx::query_scalar::<_, String>("SELECT name FROM cafe.product WHERE id = $1")
        .bind(product_id.as_i32())
        .fetch_optional(&mut **tx)
        .await?;

    Err(name.map_or(
        PlaceOrderError::ProductNotFound(product_id),
        PlaceOrderError::InsufficientStock,
    ))
}

async fn restore_stock(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE cafe.product p
        SET stock = p.stock + i.quantity
        FROM (
            SELECT product_id, SUM(quantity)::int AS quantity
            FROM cafe.order_item
            WHERE order_id = $1 AND product_id IS NOT NULL
            GROUP BY product_id
        ) i
        WHERE p.id = i.product_id
        ",
    )
    .bind(order_id.as_i32())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rupees(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[test]
    fn test_total_at_column_limit_is_accepted() {
        let limit = rupees(9_999_999_999);
        assert_eq!(check_total(limit).unwrap(), limit);
    }

    #[test]
    fn test_total_above_column_limit_is_rejected() {
        assert!(matches!(
            check_total(rupees(10_000_000_000)),
            Err(PlaceOrderError::TotalTooLarge(_))
        ));
    }
}
