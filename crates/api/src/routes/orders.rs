//! Order placement and staff order-operation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId};
use domain::{FulfillmentStatus, Order, PaymentStatus, ShippingAddress};
use fulfillment::{Charges, LineRequest, OrderAssembler, PaymentOutcome, PlaceOrder};
use serde::{Deserialize, Serialize};
use store::{OrderNumberAllocator, OrderStore, ProductStore};

use crate::error::ApiError;

/// Bounds required of a store handle shared across all three assembler roles.
pub trait Backend: ProductStore + OrderStore + OrderNumberAllocator + Clone + 'static {}

impl<T> Backend for T where T: ProductStore + OrderStore + OrderNumberAllocator + Clone + 'static {}

/// Shared application state accessible from all handlers.
pub struct AppState<S: Backend> {
    pub assembler: OrderAssembler<S, S, S>,
    pub store: S,
    /// Label for the active store implementation, reported by `/health`.
    pub backend: &'static str,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: AddressBody,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub tax_cents: Option<i64>,
    pub shipping_cents: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl From<AddressBody> for ShippingAddress {
    fn from(body: AddressBody) -> Self {
        ShippingAddress::new(
            body.street,
            body.city,
            body.state,
            body.postal_code,
            body.country,
        )
    }
}

impl From<&ShippingAddress> for AddressBody {
    fn from(addr: &ShippingAddress) -> Self {
        AddressBody {
            street: addr.street.clone(),
            city: addr.city.clone(),
            state: addr.state.clone(),
            postal_code: addr.postal_code.clone(),
            country: addr.country.clone(),
        }
    }
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: FulfillmentStatus,
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub status: PaymentStatus,
    pub reference: Option<String>,
}

#[derive(Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub order_id: String,
    pub order_number: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub order_number: String,
    pub customer_id: String,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
    pub shipping_address: AddressBody,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub refund_eligible: bool,
    pub notes: Vec<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let items = order
            .line_items()
            .iter()
            .map(|line| OrderItemResponse {
                product_id: line.product_id.to_string(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal().cents(),
            })
            .collect();

        OrderResponse {
            order_id: order.id().to_string(),
            order_number: order.order_number().to_string(),
            customer_id: order.customer_id().to_string(),
            items,
            subtotal_cents: order.subtotal().cents(),
            tax_cents: order.tax().cents(),
            shipping_cents: order.shipping_cost().cents(),
            total_cents: order.total().cents(),
            shipping_address: order.shipping_address().into(),
            payment_method: order.payment_method().to_string(),
            payment_reference: order.payment_reference().map(String::from),
            fulfillment_status: order.fulfillment_status(),
            payment_status: order.payment_status(),
            refund_eligible: order.refund_eligible(),
            notes: order.notes().to_vec(),
            active: order.is_active(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — assemble and place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let customer_id = match req.customer_id {
        Some(ref id_str) => {
            let uuid = uuid::Uuid::parse_str(id_str)
                .map_err(|e| ApiError::BadRequest(format!("Invalid customerId: {e}")))?;
            CustomerId::from_uuid(uuid)
        }
        None => CustomerId::new(),
    };

    let lines = req
        .items
        .iter()
        .map(|item| LineRequest::new(item.product_id.as_str(), item.quantity))
        .collect();

    let mut cmd = PlaceOrder::new(
        customer_id,
        lines,
        req.shipping_address.into(),
        req.payment_method,
    );
    if let Some(reference) = req.payment_reference {
        cmd = cmd.with_payment(PaymentOutcome::Captured { reference });
    }
    if req.tax_cents.is_some() || req.shipping_cents.is_some() {
        cmd = cmd.with_charges(Charges::new(
            common::Money::from_cents(req.tax_cents.unwrap_or(0)),
            common::Money::from_cents(req.shipping_cents.unwrap_or(0)),
        ));
    }

    let order = state.assembler.place_order(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            order_id: order.id().to_string(),
            order_number: order.order_number().to_string(),
        }),
    ))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .assembler
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /customers/:id/orders — list a customer's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_customer<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid customer ID: {e}")))?;
    let orders = state
        .assembler
        .orders_for_customer(CustomerId::from_uuid(uuid))
        .await?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// POST /orders/:id/status — move an order's fulfillment status.
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.assembler.transition(order_id, req.status).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/cancel — cancel an order and release its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.assembler.cancel_order(order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/payment — move an order's payment status.
#[tracing::instrument(skip(state, req))]
pub async fn set_payment<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .assembler
        .set_payment_status(order_id, req.status, req.reference)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/notes — append a staff note.
#[tracing::instrument(skip(state, req))]
pub async fn add_note<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.assembler.append_note(order_id, req.note).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// DELETE /orders/:id — hard-remove an order.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.assembler.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
