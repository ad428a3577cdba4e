//! Input types for the order assembler.

use common::{CustomerId, Money, ProductId};
use domain::{PaymentStatus, ShippingAddress};

/// One requested cart line, before pricing.
#[derive(Debug, Clone)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Outcome of the external payment step, as reported by the caller.
///
/// Actual payment capture happens outside the core; this only decides the
/// order's initial payment status and reference.
#[derive(Debug, Clone, Default)]
pub enum PaymentOutcome {
    /// Payment not yet attempted or still in flight.
    #[default]
    Pending,

    /// Payment captured up-front; the order starts confirmed.
    Captured { reference: String },

    /// Payment attempt failed; the order is recorded with a failed payment.
    Failed,
}

impl PaymentOutcome {
    pub(crate) fn status(&self) -> PaymentStatus {
        match self {
            PaymentOutcome::Pending => PaymentStatus::Pending,
            PaymentOutcome::Captured { .. } => PaymentStatus::Paid,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }

    pub(crate) fn reference(&self) -> Option<String> {
        match self {
            PaymentOutcome::Captured { reference } => Some(reference.clone()),
            _ => None,
        }
    }
}

/// Pass-through tax and shipping amounts from the external pricing
/// collaborator. Zero when none is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Charges {
    pub tax: Money,
    pub shipping: Money,
}

impl Charges {
    pub fn new(tax: Money, shipping: Money) -> Self {
        Self { tax, shipping }
    }
}

/// A cart submitted for assembly into an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub lines: Vec<LineRequest>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment: PaymentOutcome,
    pub charges: Charges,
}

impl PlaceOrder {
    /// Creates a place-order command with pending payment and zero charges.
    pub fn new(
        customer_id: CustomerId,
        lines: Vec<LineRequest>,
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            lines,
            shipping_address,
            payment_method: payment_method.into(),
            payment: PaymentOutcome::Pending,
            charges: Charges::default(),
        }
    }

    /// Sets the caller-reported payment outcome.
    pub fn with_payment(mut self, payment: PaymentOutcome) -> Self {
        self.payment = payment;
        self
    }

    /// Sets pass-through tax and shipping amounts.
    pub fn with_charges(mut self, charges: Charges) -> Self {
        self.charges = charges;
        self
    }
}
