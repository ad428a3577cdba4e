use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// Catalog record as seen by the fulfillment core: price and stock only.
///
/// The catalog service owns everything else about a product; stock is
/// mutated exclusively through [`crate::ProductStore`] reserve/release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub stock: u32,
}

impl Product {
    /// Creates a new product record.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            stock,
        }
    }
}
