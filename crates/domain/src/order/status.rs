//! Fulfillment and payment state machines.

use serde::{Deserialize, Serialize};

/// Fulfillment lifecycle stage of an order.
///
/// Transitions:
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Shipped ──► Delivered
///    │            │             │
///    └────────────┴─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    /// Order persisted, payment not yet verified.
    #[default]
    Pending,

    /// Payment verified, awaiting handling.
    Confirmed,

    /// Order is being picked and packed.
    Processing,

    /// Handed to the carrier.
    Shipped,

    /// Received by the customer (terminal).
    Delivered,

    /// Cancelled before delivery (terminal); reserved stock released.
    Cancelled,
}

impl FulfillmentStatus {
    /// Returns true if the machine allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: FulfillmentStatus) -> bool {
        use FulfillmentStatus::*;
        matches!(
            (*self, to),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing, Cancelled)
        )
    }

    /// Returns true if the order can still be cancelled from this stage.
    pub fn can_cancel(&self) -> bool {
        self.can_transition_to(FulfillmentStatus::Cancelled)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled
        )
    }

    /// Returns the status name as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Confirmed => "confirmed",
            FulfillmentStatus::Processing => "processing",
            FulfillmentStatus::Shipped => "shipped",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment lifecycle of an order, independent of fulfillment.
///
/// Transitions: `Pending → Paid | Failed`, `Paid → Refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting the external payment outcome.
    #[default]
    Pending,

    /// Payment captured by the external gateway.
    Paid,

    /// Payment attempt failed (terminal).
    Failed,

    /// A captured payment was refunded (terminal).
    Refunded,
}

impl PaymentStatus {
    /// Returns true if the machine allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((*self, to), (Pending, Paid | Failed) | (Paid, Refunded))
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Returns the status name as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
