//! Order aggregate and related types.

mod aggregate;
mod status;
mod value_objects;

pub use aggregate::{NewOrder, Order, TransitionEffect};
pub use status::{FulfillmentStatus, PaymentStatus};
pub use value_objects::{OrderLineItem, OrderNumber, ShippingAddress};

use thiserror::Error;

/// Errors that can occur while building or mutating an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Cart contained no line items.
    #[error("Order must contain at least one line item")]
    EmptyOrder,

    /// A requested line has a quantity below one.
    #[error("Invalid quantity {quantity} for product {product_id} (must be at least 1)")]
    InvalidQuantity { product_id: String, quantity: u32 },

    /// A required shipping address field is empty.
    #[error("Shipping address is missing required field: {field}")]
    IncompleteAddress { field: &'static str },

    /// Illegal fulfillment status move.
    #[error("Invalid transition: cannot move order from {from} to {to}")]
    InvalidTransition {
        from: FulfillmentStatus,
        to: FulfillmentStatus,
    },

    /// Illegal payment status move.
    #[error("Invalid payment transition: cannot move payment from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}
