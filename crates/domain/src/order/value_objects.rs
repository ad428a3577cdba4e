//! Value objects embedded in an order.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Human-readable, strictly increasing order identifier (`ORD-000123`).
///
/// Assigned exactly once at creation from the allocator's atomic counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Formats an allocated sequence value as an order number.
    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("ORD-{seq:06}"))
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the numeric sequence back out, if well-formed.
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("ORD-")?.parse().ok()
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A line of an order: quantity of one product at its snapshotted price.
///
/// The unit price is captured at order creation and never updated, even
/// when the catalog price changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// The purchased product.
    pub product_id: ProductId,

    /// Units purchased, at least 1.
    pub quantity: u32,

    /// Price per unit at the time of purchase.
    pub unit_price: Money,
}

impl OrderLineItem {
    /// Creates a new line item.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line subtotal (`quantity * unit_price`).
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Shipping destination, copied into the order at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Creates a new shipping address.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }

    /// Checks that every field is non-empty, naming the first missing one.
    pub fn validate(&self) -> Result<(), OrderError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(OrderError::IncompleteAddress { field: name });
            }
        }
        Ok(())
    }
}
