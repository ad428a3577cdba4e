//! Store traits implemented by the in-memory and Postgres backends.

use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use domain::{FulfillmentStatus, Order};

use crate::{Product, Result};

/// Product lookup plus the inventory ledger.
///
/// `reserve_stock` is the atomic check-and-decrement: the comparison against
/// current stock and the decrement happen as one indivisible operation per
/// product, so concurrent reservations can never drive stock negative.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Looks up a product's current price and stock in one read.
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Atomically decrements stock if at least `quantity` units remain.
    ///
    /// Fails with `InsufficientStock` without mutating anything otherwise.
    async fn reserve_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()>;

    /// Adds `quantity` units back to stock.
    ///
    /// Callers invoke this at most once per reservation being undone.
    async fn release_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()>;
}

/// Durable order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a newly assembled order.
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Loads an order by ID.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a customer's orders, oldest first.
    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>>;

    /// Writes back an order mutated by the state machine.
    ///
    /// The write is a compare-and-set on the fulfillment status the caller
    /// loaded: it lands only while the stored status still equals
    /// `expected_status`, and fails with `ConcurrencyConflict` otherwise.
    /// Two racing cancellations therefore produce exactly one successful
    /// write, and only that winner goes on to release stock.
    async fn update_order(&self, order: &Order, expected_status: FulfillmentStatus) -> Result<()>;

    /// Hard-removes an order.
    async fn delete_order(&self, order_id: OrderId) -> Result<()>;
}

/// Atomic source of order-number sequence values.
///
/// Two concurrent calls never observe the same value; the backing primitive
/// is an atomic increment-and-read, never read-last-and-add-one.
#[async_trait]
pub trait OrderNumberAllocator: Send + Sync {
    /// Returns the next sequence value, starting at 1.
    async fn next_order_number(&self) -> Result<u64>;
}
