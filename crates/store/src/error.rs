use common::OrderId;
use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist in the catalog.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// The atomic decrement would have taken stock below zero.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock { product_id: String, requested: u32 },

    /// The referenced order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A compare-and-set write lost to a concurrent update of the same order.
    #[error("Concurrent update of order {0}")]
    ConcurrencyConflict(OrderId),

    /// A stored numeric value fell outside its expected range.
    #[error("Out-of-range value in column {column}: {value}")]
    OutOfRange { column: &'static str, value: i64 },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for connection-level failures worth one transparent retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed
            )
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
