//! HTTP API server with observability for the order fulfillment core.
//!
//! Exposes REST endpoints for order placement and staff order operations,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use fulfillment::OrderAssembler;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::{AppState, Backend};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Backend>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", delete(routes::orders::delete::<S>))
        .route("/orders/{id}/status", post(routes::orders::set_status::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/orders/{id}/payment", post(routes::orders::set_payment::<S>))
        .route("/orders/{id}/notes", post(routes::orders::add_note::<S>))
        .route(
            "/customers/{id}/orders",
            get(routes::orders::list_for_customer::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over a store handle shared by the catalog,
/// order, and allocator roles. `backend` names the store implementation
/// for the health endpoint.
pub fn create_state<S: Backend>(store: S, backend: &'static str) -> Arc<AppState<S>> {
    let assembler = OrderAssembler::new(store.clone(), store.clone(), store.clone());
    Arc::new(AppState {
        assembler,
        store,
        backend,
    })
}
