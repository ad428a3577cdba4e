use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use common::{CustomerId, OrderId, ProductId};
use domain::{FulfillmentStatus, Order};
use tokio::sync::RwLock;

use crate::{
    Product, Result, StoreError,
    store::{OrderNumberAllocator, OrderStore, ProductStore},
};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store implementation for tests and the default server.
///
/// Per-product check-and-decrement is serialized under the state write
/// lock; the order-number counter is an `AtomicU64`. Provides the same
/// contracts as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
    order_seq: Arc<AtomicU64>,
    failing_inserts: Arc<AtomicU32>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a catalog product.
    pub async fn add_product(&self, product: Product) {
        let mut state = self.state.write().await;
        state.products.insert(product.id.clone(), product);
    }

    /// Returns a product's current stock, if it exists.
    pub async fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        let state = self.state.read().await;
        state.products.get(product_id).map(|p| p.stock)
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Makes the next `count` order inserts fail with a transient error.
    pub fn fail_next_inserts(&self, count: u32) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.get(product_id).cloned())
    }

    async fn reserve_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let product =
            state
                .products
                .get_mut(product_id)
                .ok_or_else(|| StoreError::ProductNotFound {
                    product_id: product_id.to_string(),
                })?;

        if product.stock < quantity {
            return Err(StoreError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: quantity,
            });
        }
        product.stock -= quantity;
        Ok(())
    }

    async fn release_stock(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        let product =
            state
                .products
                .get_mut(product_id)
                .ok_or_else(|| StoreError::ProductNotFound {
                    product_id: product_id.to_string(),
                })?;
        product.stock += quantity;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        if self
            .failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut state = self.state.write().await;
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.customer_id() == customer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at());
        Ok(orders)
    }

    async fn update_order(&self, order: &Order, expected_status: FulfillmentStatus) -> Result<()> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&order.id()) {
            Some(existing) => {
                if existing.fulfillment_status() != expected_status {
                    return Err(StoreError::ConcurrencyConflict(order.id()));
                }
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::OrderNotFound(order.id())),
        }
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .orders
            .remove(&order_id)
            .map(|_| ())
            .ok_or(StoreError::OrderNotFound(order_id))
    }
}

#[async_trait]
impl OrderNumberAllocator for InMemoryStore {
    async fn next_order_number(&self) -> Result<u64> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
