//! Pure order model for the fulfillment core.
//!
//! Totals and line snapshots are computed exactly once by [`Order::create`];
//! after creation only the status dimensions, payment reference, and notes
//! may change, and only through the state-machine methods.

pub mod order;

pub use common::{CustomerId, Money, OrderId, ProductId};
pub use order::{
    FulfillmentStatus, NewOrder, Order, OrderError, OrderLineItem, OrderNumber, PaymentStatus,
    ShippingAddress, TransitionEffect,
};
