//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::orders::{AppState, Backend};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Which store implementation serves this process.
    pub backend: &'static str,
}

/// GET /health — reports liveness and the active store backend.
pub async fn check<S: Backend>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.backend,
    })
}
