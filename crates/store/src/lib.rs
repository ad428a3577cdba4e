//! Persistence boundary for the fulfillment core.
//!
//! All shared mutable state (per-product stock, the order-number counter)
//! is mutated only through the trait methods here, each backed by an atomic
//! primitive of the store: a map write lock or `AtomicU64` in memory,
//! conditional `UPDATE`s and a single-row counter in Postgres.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod product;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use product::Product;
pub use store::{OrderNumberAllocator, OrderStore, ProductStore};
