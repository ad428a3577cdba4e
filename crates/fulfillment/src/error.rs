use common::OrderId;
use domain::OrderError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by the order assembler.
///
/// Reservation-phase and persistence-phase failures are only returned
/// after every reservation made for the same call has been released.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Malformed input or an illegal state-machine move. No side effects.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A requested product does not exist. Nothing was reserved.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// A product had too little stock. Partial reservations were rolled back.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: u32 },

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order was updated concurrently; the caller should reload and
    /// retry if the operation still applies.
    #[error("Order {0} was modified concurrently")]
    UpdateConflict(OrderId),

    /// The backing store failed (after one retry for transient errors).
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for FulfillmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound { product_id } => {
                FulfillmentError::ProductNotFound { product_id }
            }
            StoreError::InsufficientStock {
                product_id,
                requested,
            } => FulfillmentError::InsufficientStock {
                product_id,
                requested,
            },
            StoreError::OrderNotFound(id) => FulfillmentError::OrderNotFound(id),
            StoreError::ConcurrencyConflict(id) => FulfillmentError::UpdateConflict(id),
            other => FulfillmentError::Store(other),
        }
    }
}
