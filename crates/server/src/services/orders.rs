//! Order placement and lifecycle.
//!
//! Wraps [`OrderRepository`] with the shop-level rules: the shop must be
//! accepting orders, the OTP gate must be satisfied when enabled, and
//! notification emails go out after the transaction commits.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use real_taste_core::{OrderId, OrderStatus, Price};

use super::email::Mailer;
use super::settings::SettingsCache;
use crate::db::{OrderRepository, PlaceOrderError, RepositoryError, StatusChangeError};
use crate::models::ValidationError;
use crate::models::order::{CreateOrderRequest, Order, PaymentResult};
use crate::models::session::{CurrentUser, VerifiedOtp};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("shop is currently closed")]
    ShopClosed,

    #[error("email verification required")]
    VerificationRequired,

    #[error("product not found")]
    ProductNotFound,

    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("minimum order amount is {0}")]
    BelowMinimum(Price),

    #[error("order not found")]
    NotFound,

    #[error("not authorized to view this order")]
    Forbidden,

    #[error("cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PlaceOrderError> for OrderError {
    fn from(e: PlaceOrderError) -> Self {
        match e {
            PlaceOrderError::ProductNotFound(_) => Self::ProductNotFound,
            PlaceOrderError::InsufficientStock(name) => Self::InsufficientStock(name),
            PlaceOrderError::BelowMinimum(minimum) => Self::BelowMinimum(minimum),
            PlaceOrderError::Overflow(_) | PlaceOrderError::TotalTooLarge(_) => {
                Self::Validation(ValidationError::new("Order total is too large"))
            }
            PlaceOrderError::QuantityTooLarge(_) => {
                Self::Validation(ValidationError::new("Quantity is too large"))
            }
            PlaceOrderError::Repository(e) => Self::Repository(e),
        }
    }
}

impl From<StatusChangeError> for OrderError {
    fn from(e: StatusChangeError) -> Self {
        match e {
            StatusChangeError::NotFound => Self::NotFound,
            StatusChangeError::InvalidTransition { from, to } => {
                Self::InvalidTransition { from, to }
            }
            StatusChangeError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Whether the OTP gate lets `customer` place an order.
#[must_use]
pub fn otp_gate_satisfied(
    otp_required: bool,
    customer: &CurrentUser,
    verified: Option<&VerifiedOtp>,
) -> bool {
    !otp_required || verified.is_some_and(|marker| marker.is_valid_for(&customer.email, Utc::now()))
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    settings: &'a SettingsCache,
    mailer: &'a Mailer,
    admin_email: &'a str,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        settings: &'a SettingsCache,
        mailer: &'a Mailer,
        admin_email: &'a str,
    ) -> Self {
        Self {
            pool,
            settings,
            mailer,
            admin_email,
        }
    }

    /// Place an order for `customer`.
    ///
    /// `verified` is the OTP marker from the customer's session; it is only
    /// checked when the shop has OTP verification enabled. The caller removes
    /// the marker once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError` for invalid input, a closed shop, a missing OTP
    /// verification, stock problems or a total below the minimum.
    pub async fn place(
        &self,
        customer: &CurrentUser,
        request: CreateOrderRequest,
        verified: Option<&VerifiedOtp>,
    ) -> Result<Order, OrderError> {
        let new_order = request.validate()?;

        let shop = self.settings.shop(self.pool).await?;
        if !shop.accepts_orders() {
            return Err(OrderError::ShopClosed);
        }
        if !otp_gate_satisfied(shop.otp_verification, customer, verified) {
            return Err(OrderError::VerificationRequired);
        }

        let minimum = self.settings.store(self.pool).await?.minimum_order_amount;
        let order = OrderRepository::new(self.pool)
            .place(customer.id, &new_order, minimum)
            .await?;

        info!(
            order_id = %order.id,
            user_id = %customer.id,
            total = %order.total_amount,
            "Order placed"
        );

        self.notify_order_placed(customer, &order, shop.preparation_time);
        Ok(order)
    }

    fn notify_order_placed(&self, customer: &CurrentUser, order: &Order, preparation_time: i32) {
        let mailer = self.mailer.clone();
        let admin_email = self.admin_email.to_owned();
        let customer = customer.clone();
        let order = order.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_order_confirmation(
                    customer.email.as_str(),
                    &customer.name,
                    &order,
                    preparation_time,
                )
                .await
            {
                warn!(order_id = %order.id, error = %e, "Failed to send order confirmation");
            }
            if let Err(e) = mailer
                .send_order_admin_notification(
                    &admin_email,
                    &customer.name,
                    customer.email.as_str(),
                    &order,
                )
                .await
            {
                warn!(order_id = %order.id, error = %e, "Failed to send admin order notification");
            }
        });
    }

    /// Load an order the viewer owns, or any order for admins.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Forbidden`.
    pub async fn get_for(&self, viewer: &CurrentUser, id: OrderId) -> Result<Order, OrderError> {
        let order = OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(OrderError::NotFound)?;
        if order.user_id != viewer.id && !viewer.is_admin() {
            return Err(OrderError::Forbidden);
        }
        Ok(order)
    }

    /// Change an order's status and email the customer.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::InvalidTransition`.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        let repo = OrderRepository::new(self.pool);
        let previous = repo.update_status(id, next).await?;
        let order = repo.get(id).await?.ok_or(OrderError::NotFound)?;

        info!(order_id = %id, from = %previous, to = %next, "Order status updated");

        if previous != next
            && let Some(customer) = order.customer.clone()
        {
            let mailer = self.mailer.clone();
            let snapshot = order.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer
                    .send_order_status_update(customer.email.as_str(), &customer.name, &snapshot)
                    .await
                {
                    warn!(order_id = %snapshot.id, error = %e, "Failed to send status update");
                }
            });
        }

        Ok(order)
    }

    /// Record a payment against an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    pub async fn mark_paid(&self, id: OrderId, result: &PaymentResult) -> Result<Order, OrderError> {
        let repo = OrderRepository::new(self.pool);
        repo.mark_paid(id, result).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => OrderError::Repository(other),
        })?;
        repo.get(id).await?.ok_or(OrderError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use real_taste_core::{Email, UserId, UserRole};

    use super::*;

    fn customer() -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            name: "Asha".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_gate_open_when_disabled() {
        assert!(otp_gate_satisfied(false, &customer(), None));
    }

    #[test]
    fn test_gate_requires_marker() {
        assert!(!otp_gate_satisfied(true, &customer(), None));
        let marker = VerifiedOtp::new(customer().email);
        assert!(otp_gate_satisfied(true, &customer(), Some(&marker)));
    }

    #[test]
    fn test_gate_rejects_other_email() {
        let marker = VerifiedOtp::new(Email::parse("ravi@example.com").unwrap());
        assert!(!otp_gate_satisfied(true, &customer(), Some(&marker)));
    }

    #[test]
    fn test_oversized_orders_are_validation_errors() {
        let total = Price::new(rust_decimal::Decimal::new(10_000_000_000, 2)).unwrap();
        assert!(matches!(
            OrderError::from(PlaceOrderError::TotalTooLarge(total)),
            OrderError::Validation(e) if e.0 == "Order total is too large"
        ));

        let product = real_taste_core::ProductId::new(7);
        assert!(matches!(
            OrderError::from(PlaceOrderError::QuantityTooLarge(product)),
            OrderError::Validation(e) if e.0 == "Quantity is too large"
        ));
    }

    #[test]
    fn test_gate_rejects_stale_marker() {
        let mut marker = VerifiedOtp::new(customer().email);
        marker.verified_at -= Duration::minutes(11);
        assert!(!otp_gate_satisfied(true, &customer(), Some(&marker)));
    }

    #[test]
    fn test_place_error_mapping() {
        assert!(matches!(
            OrderError::from(PlaceOrderError::InsufficientStock("Chai".to_string())),
            OrderError::InsufficientStock(name) if name == "Chai"
        ));
        assert!(matches!(
            OrderError::from(StatusChangeError::NotFound),
            OrderError::NotFound
        ));
    }
}
