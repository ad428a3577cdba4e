//! Order assembler: the only component allowed to run compensating actions.

use common::{CustomerId, OrderId, ProductId};
use domain::{
    FulfillmentStatus, NewOrder, Order, OrderError, OrderLineItem, OrderNumber, PaymentStatus,
    TransitionEffect,
};
use store::{OrderNumberAllocator, OrderStore, ProductStore, StoreError};

use crate::command::PlaceOrder;
use crate::error::FulfillmentError;

/// Orchestrates order placement and the staff order operations.
///
/// Placement reserves stock before the order is persisted and rolls every
/// reservation back if a later step fails, so stock is never left
/// decremented for an order that does not exist. No in-process lock is held
/// across store calls; per-product atomicity is the store's job.
pub struct OrderAssembler<C, O, N>
where
    C: ProductStore,
    O: OrderStore,
    N: OrderNumberAllocator,
{
    catalog: C,
    orders: O,
    numbers: N,
}

impl<C, O, N> OrderAssembler<C, O, N>
where
    C: ProductStore,
    O: OrderStore,
    N: OrderNumberAllocator,
{
    /// Creates a new assembler over the given store handles.
    pub fn new(catalog: C, orders: O, numbers: N) -> Self {
        Self {
            catalog,
            orders,
            numbers,
        }
    }

    /// Turns a validated cart into a persisted order.
    ///
    /// Steps: validate the cart shape, look up every product (failing
    /// before any reservation when one is missing), reserve stock line by
    /// line, snapshot prices from the same lookups, compute totals,
    /// allocate the order number, persist. The first reservation failure
    /// releases everything reserved so far; a persistence failure is
    /// retried once if transient and otherwise also rolls back.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, FulfillmentError> {
        metrics::counter!("orders_place_attempts_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.place_order_inner(cmd).await;
        metrics::histogram!("place_order_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    order_number = %order.order_number(),
                    total_cents = order.total().cents(),
                    "order placed"
                );
            }
            Err(err) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(error = %err, "order placement failed");
            }
        }
        result
    }

    async fn place_order_inner(&self, cmd: PlaceOrder) -> Result<Order, FulfillmentError> {
        // 1. Cart shape, before any side effect.
        if cmd.lines.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        for line in &cmd.lines {
            if line.quantity < 1 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                }
                .into());
            }
        }
        cmd.shipping_address.validate()?;

        // 2. Resolve every product first; a missing one fails the whole
        // call with nothing reserved yet. Prices are snapshotted from the
        // same lookup that proves existence.
        let mut lines = Vec::with_capacity(cmd.lines.len());
        for request in &cmd.lines {
            let product = self
                .catalog
                .get_product(&request.product_id)
                .await?
                .ok_or_else(|| FulfillmentError::ProductNotFound {
                    product_id: request.product_id.to_string(),
                })?;
            lines.push(OrderLineItem::new(
                product.id,
                request.quantity,
                product.unit_price,
            ));
        }

        // 3. Reserve in sequence; first failure rolls back what landed.
        let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(lines.len());
        for line in &lines {
            match self
                .catalog
                .reserve_stock(&line.product_id, line.quantity)
                .await
            {
                Ok(()) => reserved.push((line.product_id.clone(), line.quantity)),
                Err(err) => {
                    self.release_reserved(&reserved).await;
                    return Err(err.into());
                }
            }
        }

        // 4.-6. Totals are frozen by the factory; the number is allocated
        // as the last step before persistence so numbers follow allocation
        // order.
        let order_number = match self.numbers.next_order_number().await {
            Ok(seq) => OrderNumber::from_sequence(seq),
            Err(err) => {
                self.release_reserved(&reserved).await;
                return Err(err.into());
            }
        };

        let order = match Order::create(NewOrder {
            id: OrderId::new(),
            order_number,
            customer_id: cmd.customer_id,
            lines,
            shipping_address: cmd.shipping_address,
            payment_method: cmd.payment_method,
            payment_reference: cmd.payment.reference(),
            payment_status: cmd.payment.status(),
            tax: cmd.charges.tax,
            shipping_cost: cmd.charges.shipping,
        }) {
            Ok(order) => order,
            Err(err) => {
                self.release_reserved(&reserved).await;
                return Err(err.into());
            }
        };

        // 7. Persist, retrying once for transient store failures. The
        // reservations must not outlive a failed attempt.
        if let Err(err) = self.insert_with_retry(&order).await {
            self.release_reserved(&reserved).await;
            return Err(err.into());
        }

        Ok(order)
    }

    async fn insert_with_retry(&self, order: &Order) -> Result<(), StoreError> {
        match self.orders.insert_order(order).await {
            Err(err) if err.is_transient() => {
                tracing::warn!(order_id = %order.id(), error = %err, "transient insert failure, retrying once");
                self.orders.insert_order(order).await
            }
            other => other,
        }
    }

    /// Releases reservations made earlier in the same call, newest first.
    async fn release_reserved(&self, reserved: &[(ProductId, u32)]) {
        for (product_id, quantity) in reserved.iter().rev() {
            if let Err(err) = self.catalog.release_stock(product_id, *quantity).await {
                // Nothing left to do but record it; the reservation is leaked.
                tracing::error!(%product_id, quantity, error = %err, "rollback release failed");
            }
        }
    }

    /// Moves an order's fulfillment status, releasing stock on cancellation.
    ///
    /// The write back to the store is a compare-and-set on the status this
    /// call loaded, so of two racing cancellations exactly one lands; only
    /// that winner releases stock, and the cancelled order is persisted
    /// with its release recorded before the stock is handed back.
    #[tracing::instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: OrderId,
        to: FulfillmentStatus,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.load(order_id).await?;
        let from = order.fulfillment_status();
        let effect = order.transition(to)?;
        self.orders.update_order(&order, from).await?;

        if let TransitionEffect::ReleaseStock(quantities) = effect {
            let mut first_failure: Option<StoreError> = None;
            for (product_id, quantity) in &quantities {
                if let Err(err) = self.catalog.release_stock(product_id, *quantity).await {
                    tracing::error!(%product_id, quantity, error = %err, "stock release on cancellation failed");
                    first_failure.get_or_insert(err);
                }
            }
            if let Some(err) = first_failure {
                return Err(err.into());
            }

            metrics::counter!("order_cancellations_total").increment(1);
            if order.refund_eligible() {
                tracing::info!(
                    %order_id,
                    order_number = %order.order_number(),
                    "cancelled order was paid; refund due externally"
                );
            }
        }

        Ok(order)
    }

    /// Cancels an order: the `cancelled` transition plus stock release.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        self.transition(order_id, FulfillmentStatus::Cancelled)
            .await
    }

    /// Moves an order's payment status, optionally recording a reference.
    #[tracing::instrument(skip(self))]
    pub async fn set_payment_status(
        &self,
        order_id: OrderId,
        to: PaymentStatus,
        reference: Option<String>,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.load(order_id).await?;
        order.set_payment_status(to, reference)?;
        self.orders
            .update_order(&order, order.fulfillment_status())
            .await?;
        Ok(order)
    }

    /// Appends a staff note to an order.
    #[tracing::instrument(skip(self, note))]
    pub async fn append_note(
        &self,
        order_id: OrderId,
        note: impl Into<String>,
    ) -> Result<Order, FulfillmentError> {
        let mut order = self.load(order_id).await?;
        order.append_note(note);
        self.orders
            .update_order(&order, order.fulfillment_status())
            .await?;
        Ok(order)
    }

    /// Loads an order by ID; `None` when it does not exist.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, FulfillmentError> {
        Ok(self.orders.get_order(order_id).await?)
    }

    /// Lists a customer's orders, oldest first.
    pub async fn orders_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, FulfillmentError> {
        Ok(self.orders.orders_for_customer(customer_id).await?)
    }

    /// Hard-removes an order. Cancellation is the preferred terminal state;
    /// deletion does not touch stock.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), FulfillmentError> {
        self.orders.delete_order(order_id).await?;
        Ok(())
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, FulfillmentError> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }
}
