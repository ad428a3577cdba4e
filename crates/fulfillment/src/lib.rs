//! Order assembly and staff-facing order operations.
//!
//! [`OrderAssembler::place_order`] turns a cart into a durable order:
//! validate, look up every product, reserve stock line by line with full
//! rollback on the first failure, snapshot prices, allocate the order
//! number, persist. All compensating releases happen here and nowhere else.

mod assembler;
mod command;
mod error;

pub use assembler::OrderAssembler;
pub use command::{Charges, LineRequest, PaymentOutcome, PlaceOrder};
pub use error::FulfillmentError;
