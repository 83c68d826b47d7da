//! Shopping cart models.

use serde::{Deserialize, Serialize};

use real_taste_core::{Price, PriceError, ProductId};

/// One product line in a cart, priced at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub subtotal: Price,
}

impl CartLine {
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the subtotal overflows.
    pub fn new(
        product_id: ProductId,
        name: String,
        price: Price,
        quantity: u32,
    ) -> Result<Self, PriceError> {
        Ok(Self {
            product_id,
            name,
            price,
            quantity,
            subtotal: price.times(quantity)?,
        })
    }
}

/// A user's cart with computed totals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartLine>,
    /// Sum of line quantities.
    pub total_items: u32,
    /// Sum of line subtotals.
    pub total_amount: Price,
}

impl Cart {
    /// Compute totals over `items`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the total overflows.
    pub fn from_lines(items: Vec<CartLine>) -> Result<Self, PriceError> {
        let mut total_items: u32 = 0;
        let mut total_amount = Price::zero();
        for line in &items {
            total_items = total_items
                .checked_add(line.quantity)
                .ok_or(PriceError::Overflow)?;
            total_amount = total_amount.checked_add(line.subtotal)?;
        }
        Ok(Self {
            items,
            total_items,
            total_amount,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `POST /api/cart/add` payload.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: i32, paise: i64, quantity: u32) -> CartLine {
        let price = Price::new(Decimal::new(paise, 2)).unwrap();
        CartLine::new(ProductId::new(id), format!("Item {id}"), price, quantity).unwrap()
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = Cart::from_lines(Vec::new()).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_items, 0);
        assert!(cart.total_amount.is_zero());
    }

    #[test]
    fn test_totals_sum_quantities_and_subtotals() {
        let cart = Cart::from_lines(vec![line(1, 2500, 2), line(2, 12_050, 1)]).unwrap();
        assert_eq!(cart.total_items, 3);
        assert_eq!(cart.total_amount.amount(), Decimal::new(17_050, 2));
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line(1, 4000, 3).subtotal.amount(), Decimal::new(12_000, 2));
    }

    #[test]
    fn test_serializes_camel_case() {
        let cart = Cart::from_lines(vec![line(5, 1000, 1)]).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["totalItems"], 1);
        assert_eq!(json["totalAmount"], "10.00");
        assert_eq!(json["items"][0]["productId"], 5);
    }
}
