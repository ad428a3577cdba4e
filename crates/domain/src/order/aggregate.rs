//! Order aggregate: factory construction and post-creation state machine.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use super::{
    FulfillmentStatus, OrderError, OrderLineItem, OrderNumber, PaymentStatus, ShippingAddress,
};

/// Input to [`Order::create`]: everything the assembler resolved for a cart.
///
/// Line items arrive already priced from the catalog snapshot; tax and
/// shipping are pass-through amounts supplied by the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_id: CustomerId,
    pub lines: Vec<OrderLineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub payment_status: PaymentStatus,
    pub tax: Money,
    pub shipping_cost: Money,
}

/// Side effect the caller must carry out after a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEffect {
    /// No inventory action required.
    None,

    /// Release the listed quantities back to stock. Emitted exactly once,
    /// on the transition into `cancelled`.
    ReleaseStock(Vec<(ProductId, u32)>),
}

/// A customer order with frozen line snapshots and totals.
///
/// Constructed only through [`Order::create`], which computes subtotal and
/// total once. Afterwards the aggregate exposes no way to touch line items,
/// address, or amounts; only [`Order::transition`],
/// [`Order::set_payment_status`], and [`Order::append_note`] mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    customer_id: CustomerId,
    line_items: Vec<OrderLineItem>,
    subtotal: Money,
    tax: Money,
    shipping_cost: Money,
    total: Money,
    shipping_address: ShippingAddress,
    payment_method: String,
    payment_reference: Option<String>,
    fulfillment_status: FulfillmentStatus,
    payment_status: PaymentStatus,
    notes: Vec<String>,
    stock_released: bool,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a new order, validating the cart shape and freezing totals.
    ///
    /// The initial fulfillment status is `confirmed` when payment was
    /// already captured, `pending` otherwise.
    pub fn create(params: NewOrder) -> Result<Self, OrderError> {
        if params.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for line in &params.lines {
            if line.quantity < 1 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                });
            }
        }
        params.shipping_address.validate()?;

        let subtotal: Money = params.lines.iter().map(OrderLineItem::subtotal).sum();
        let total = subtotal + params.tax + params.shipping_cost;

        let fulfillment_status = if params.payment_status == PaymentStatus::Paid {
            FulfillmentStatus::Confirmed
        } else {
            FulfillmentStatus::Pending
        };

        let now = Utc::now();
        Ok(Self {
            id: params.id,
            order_number: params.order_number,
            customer_id: params.customer_id,
            line_items: params.lines,
            subtotal,
            tax: params.tax,
            shipping_cost: params.shipping_cost,
            total,
            shipping_address: params.shipping_address,
            payment_method: params.payment_method,
            payment_reference: params.payment_reference,
            fulfillment_status,
            payment_status: params.payment_status,
            notes: Vec::new(),
            stock_released: false,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the fulfillment status, enforcing the state machine.
    ///
    /// The transition into `cancelled` marks the order inactive, records
    /// that its stock has been handed back, and returns the quantities to
    /// release. A repeated cancellation fails the machine check, so the
    /// release effect is produced at most once per order.
    pub fn transition(
        &mut self,
        to: FulfillmentStatus,
    ) -> Result<TransitionEffect, OrderError> {
        if !self.fulfillment_status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.fulfillment_status,
                to,
            });
        }

        self.fulfillment_status = to;
        self.updated_at = Utc::now();

        if to == FulfillmentStatus::Cancelled && !self.stock_released {
            self.stock_released = true;
            self.active = false;
            let quantities = self
                .line_items
                .iter()
                .map(|line| (line.product_id.clone(), line.quantity))
                .collect();
            return Ok(TransitionEffect::ReleaseStock(quantities));
        }

        Ok(TransitionEffect::None)
    }

    /// Moves the payment status, enforcing the payment machine.
    pub fn set_payment_status(
        &mut self,
        to: PaymentStatus,
        reference: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.payment_status.can_transition_to(to) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to,
            });
        }
        self.payment_status = to;
        if reference.is_some() {
            self.payment_reference = reference;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Appends a staff note.
    pub fn append_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
        self.updated_at = Utc::now();
    }

    /// True when the order was cancelled while its payment was captured,
    /// meaning a refund should be issued externally.
    pub fn refund_eligible(&self) -> bool {
        self.fulfillment_status == FulfillmentStatus::Cancelled
            && self.payment_status == PaymentStatus::Paid
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn line_items(&self) -> &[OrderLineItem] {
        &self.line_items
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn fulfillment_status(&self) -> FulfillmentStatus {
        self.fulfillment_status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn stock_released(&self) -> bool {
        self.stock_released
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress::new("1 Main St", "Springfield", "IL", "62701", "US")
    }

    fn params(lines: Vec<OrderLineItem>) -> NewOrder {
        NewOrder {
            id: OrderId::new(),
            order_number: OrderNumber::from_sequence(1),
            customer_id: CustomerId::new(),
            lines,
            shipping_address: address(),
            payment_method: "card".to_string(),
            payment_reference: None,
            payment_status: PaymentStatus::Pending,
            tax: Money::zero(),
            shipping_cost: Money::zero(),
        }
    }

    fn two_line_order() -> Order {
        Order::create(params(vec![
            OrderLineItem::new("P1", 2, Money::from_cents(10)),
            OrderLineItem::new("P2", 1, Money::from_cents(25)),
        ]))
        .unwrap()
    }

    #[test]
    fn totals_frozen_at_creation() {
        let order = two_line_order();
        assert_eq!(order.subtotal().cents(), 45);
        assert_eq!(order.total().cents(), 45);
        assert_eq!(
            order.subtotal(),
            order.line_items().iter().map(OrderLineItem::subtotal).sum()
        );
    }

    #[test]
    fn total_includes_tax_and_shipping() {
        let mut p = params(vec![OrderLineItem::new("P1", 1, Money::from_cents(100))]);
        p.tax = Money::from_cents(8);
        p.shipping_cost = Money::from_cents(50);
        let order = Order::create(p).unwrap();
        assert_eq!(order.subtotal().cents(), 100);
        assert_eq!(order.total().cents(), 158);
        assert_eq!(
            order.total(),
            order.subtotal() + order.tax() + order.shipping_cost()
        );
    }

    #[test]
    fn empty_cart_rejected() {
        let result = Order::create(params(vec![]));
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn zero_quantity_rejected() {
        let result = Order::create(params(vec![OrderLineItem::new(
            "P1",
            0,
            Money::from_cents(100),
        )]));
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn incomplete_address_rejected() {
        let mut p = params(vec![OrderLineItem::new("P1", 1, Money::from_cents(100))]);
        p.shipping_address.city = String::new();
        let result = Order::create(p);
        assert!(matches!(
            result,
            Err(OrderError::IncompleteAddress { field: "city" })
        ));
    }

    #[test]
    fn captured_payment_starts_confirmed() {
        let mut p = params(vec![OrderLineItem::new("P1", 1, Money::from_cents(100))]);
        p.payment_status = PaymentStatus::Paid;
        p.payment_reference = Some("TXN-1".to_string());
        let order = Order::create(p).unwrap();
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Confirmed);
        assert_eq!(order.payment_reference(), Some("TXN-1"));
    }

    #[test]
    fn pending_payment_starts_pending() {
        let order = two_line_order();
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert!(order.is_active());
        assert!(!order.stock_released());
    }

    #[test]
    fn full_forward_lifecycle() {
        let mut order = two_line_order();
        for status in [
            FulfillmentStatus::Confirmed,
            FulfillmentStatus::Processing,
            FulfillmentStatus::Shipped,
            FulfillmentStatus::Delivered,
        ] {
            let effect = order.transition(status).unwrap();
            assert_eq!(effect, TransitionEffect::None);
        }
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Delivered);
        assert!(!order.stock_released());
    }

    #[test]
    fn skipping_a_stage_rejected() {
        let mut order = two_line_order();
        let result = order.transition(FulfillmentStatus::Shipped);
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Pending);
    }

    #[test]
    fn cancellation_yields_release_effect_once() {
        let mut order = two_line_order();
        order.transition(FulfillmentStatus::Confirmed).unwrap();

        let effect = order.transition(FulfillmentStatus::Cancelled).unwrap();
        match effect {
            TransitionEffect::ReleaseStock(quantities) => {
                assert_eq!(
                    quantities,
                    vec![(ProductId::new("P1"), 2), (ProductId::new("P2"), 1)]
                );
            }
            TransitionEffect::None => panic!("expected release effect"),
        }
        assert!(order.stock_released());
        assert!(!order.is_active());

        // A second cancellation fails the machine check; no second release.
        let again = order.transition(FulfillmentStatus::Cancelled);
        assert!(matches!(again, Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn delivered_order_cannot_be_cancelled() {
        let mut order = two_line_order();
        order.transition(FulfillmentStatus::Confirmed).unwrap();
        order.transition(FulfillmentStatus::Processing).unwrap();
        order.transition(FulfillmentStatus::Shipped).unwrap();
        order.transition(FulfillmentStatus::Delivered).unwrap();

        let result = order.transition(FulfillmentStatus::Cancelled);
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn payment_transitions() {
        let mut order = two_line_order();
        order
            .set_payment_status(PaymentStatus::Paid, Some("TXN-9".to_string()))
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.payment_reference(), Some("TXN-9"));

        order.set_payment_status(PaymentStatus::Refunded, None).unwrap();
        // Reference survives a transition without a new one.
        assert_eq!(order.payment_reference(), Some("TXN-9"));

        let result = order.set_payment_status(PaymentStatus::Paid, None);
        assert!(matches!(
            result,
            Err(OrderError::InvalidPaymentTransition { .. })
        ));
    }

    #[test]
    fn cancelled_paid_order_is_refund_eligible() {
        let mut order = two_line_order();
        order.set_payment_status(PaymentStatus::Paid, None).unwrap();
        assert!(!order.refund_eligible());

        order.transition(FulfillmentStatus::Cancelled).unwrap();
        assert!(order.refund_eligible());
    }

    #[test]
    fn notes_append() {
        let mut order = two_line_order();
        order.append_note("customer asked for gift wrap");
        order.append_note("left with neighbour");
        assert_eq!(order.notes().len(), 2);
        assert_eq!(order.notes()[0], "customer asked for gift wrap");
    }

    #[test]
    fn serialization_roundtrip_preserves_snapshot_prices() {
        let order = two_line_order();
        let json = serde_json::to_string(&order).unwrap();
        let parsed: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id(), order.id());
        assert_eq!(parsed.order_number(), order.order_number());
        assert_eq!(parsed.line_items(), order.line_items());
        assert_eq!(parsed.total(), order.total());
        assert_eq!(parsed.line_items()[0].unit_price.cents(), 10);
    }
}
