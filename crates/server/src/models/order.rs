//! Order models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use real_taste_core::{
    Email, MobileNumber, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Price,
    ProductId, UserId,
};

use super::{ValidationError, check_max_len};

pub const MAX_INSTRUCTIONS_LENGTH: usize = 500;

/// A line of a placed order, frozen at the price charged.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the menu.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub quantity: i32,
    pub price: Price,
}

/// Name and email of the customer, included in admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: Email,
}

/// Record of a completed payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email: Option<String>,
}

/// A takeaway order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Human-facing reference such as `#000042`.
    pub reference: String,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub mobile_number: MobileNumber,
    pub special_instructions: String,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_result: Option<PaymentResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A requested line in `POST /api/orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `POST /api/orders` payload.
///
/// Any `totalAmount` the client sends is ignored; totals always come from
/// stored product prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// A validated order request ready for placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Distinct products with merged quantities, in first-seen order.
    pub lines: Vec<OrderLineRequest>,
    pub mobile_number: MobileNumber,
    pub special_instructions: String,
    pub payment_method: PaymentMethod,
}

impl CreateOrderRequest {
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty item list, a zero quantity, an
    /// invalid mobile number or over-long instructions.
    pub fn validate(self) -> Result<NewOrder, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::new("No order items"));
        }
        let lines = merge_lines(&self.items)?;
        let mobile_number = MobileNumber::parse(&self.mobile_number)
            .map_err(|_| ValidationError::new("Please enter a valid 10-digit mobile number"))?;
        let special_instructions = self
            .special_instructions
            .unwrap_or_default()
            .trim()
            .to_owned();
        check_max_len(
            &special_instructions,
            "Special instructions",
            MAX_INSTRUCTIONS_LENGTH,
        )?;
        Ok(NewOrder {
            lines,
            mobile_number,
            special_instructions,
            payment_method: self.payment_method.unwrap_or_default(),
        })
    }
}

/// Merge duplicate product lines by summing their quantities.
///
/// # Errors
///
/// Returns `ValidationError` if any quantity is zero or a merged quantity overflows.
pub fn merge_lines(items: &[OrderLineRequest]) -> Result<Vec<OrderLineRequest>, ValidationError> {
    let mut merged: Vec<OrderLineRequest> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(ValidationError::new("Quantity must be at least 1"));
        }
        if let Some(existing) = merged.iter_mut().find(|l| l.product_id == item.product_id) {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .filter(|q| i32::try_from(*q).is_ok())
                .ok_or_else(|| ValidationError::new("Quantity is too large"))?;
        } else if i32::try_from(item.quantity).is_err() {
            return Err(ValidationError::new("Quantity is too large"));
        } else {
            merged.push(*item);
        }
    }
    Ok(merged)
}

/// `PUT /api/orders/{id}/status` payload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// `PUT /api/orders/{id}/pay` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentUpdate {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

impl From<PaymentUpdate> for PaymentResult {
    fn from(update: PaymentUpdate) -> Self {
        Self {
            id: update.id,
            status: update.status,
            update_time: update.update_time,
            email: update.email_address,
        }
    }
}

/// Order count and sales for one calendar day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyOrders {
    pub date: NaiveDate,
    pub orders: i64,
    pub sales: Price,
}

/// Admin dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    /// Sum over orders that were not cancelled.
    pub total_sales: Price,
    /// The most recent days with orders, newest first.
    pub daily_orders: Vec<DailyOrders>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, quantity: u32) -> OrderLineRequest {
        OrderLineRequest {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    fn request(items: Vec<OrderLineRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            items,
            mobile_number: "9876543210".to_string(),
            special_instructions: Some("  less spicy ".to_string()),
            payment_method: None,
        }
    }

    #[test]
    fn test_merge_sums_duplicates_in_order() {
        let merged = merge_lines(&[line(2, 1), line(1, 2), line(2, 3)]).unwrap();
        assert_eq!(merged, vec![line(2, 4), line(1, 2)]);
    }

    #[test]
    fn test_merge_rejects_zero_quantity() {
        assert!(merge_lines(&[line(1, 0)]).is_err());
    }

    #[test]
    fn test_merge_rejects_overflow() {
        assert!(merge_lines(&[line(1, u32::MAX), line(1, 1)]).is_err());
        assert!(merge_lines(&[line(1, u32::MAX)]).is_err());
    }

    #[test]
    fn test_validate_defaults_and_trims() {
        let order = request(vec![line(1, 1)]).validate().unwrap();
        assert_eq!(order.payment_method, PaymentMethod::Cash);
        assert_eq!(order.special_instructions, "less spicy");
        assert_eq!(order.mobile_number.as_str(), "9876543210");
    }

    #[test]
    fn test_validate_rejects_empty_items() {
        assert_eq!(
            request(Vec::new()).validate().unwrap_err(),
            ValidationError::new("No order items")
        );
    }

    #[test]
    fn test_validate_rejects_bad_mobile() {
        let mut req = request(vec![line(1, 1)]);
        req.mobile_number = "12345".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_instructions() {
        let mut req = request(vec![line(1, 1)]);
        req.special_instructions = Some("x".repeat(501));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_payment_update_maps_email() {
        let result = PaymentResult::from(PaymentUpdate {
            id: Some("txn_1".to_string()),
            status: Some("COMPLETED".to_string()),
            update_time: None,
            email_address: Some("asha@example.com".to_string()),
        });
        assert_eq!(result.email.as_deref(), Some("asha@example.com"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["updateTime"], serde_json::Value::Null);
    }
}
