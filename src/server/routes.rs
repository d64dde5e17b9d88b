//! Axum route handlers for the grid server.
//!
//! # Routes
//!
//! - `GET  /health`   - Returns `{"status": "ok", "version": ..., "modules": [...], "dispatch_timeout_ms": ...}`
//! - `POST /dispatch` - Raw wire message in, raw module result out
//! - `GET  /routes`   - Registered and learned trie routes

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::{Kernel, KernelError};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// The kernel every request is dispatched through.
    pub kernel: Arc<Kernel>,
}

impl AppState {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self { kernel }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(Kernel::new()))
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/dispatch", post(dispatch_handler))
        .route("/routes", get(routes_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Status code and JSON body for a failed dispatch.
fn error_response(err: &KernelError) -> (StatusCode, Json<Value>) {
    let status = match err {
        KernelError::Codec(_) => StatusCode::BAD_REQUEST,
        KernelError::NoHandler { .. } => StatusCode::NOT_FOUND,
        KernelError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// GET /health: liveness probe.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let modules: Vec<String> = state
        .kernel
        .modules()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "promisegrid",
        "modules": modules,
        "dispatch_timeout_ms": state.kernel.dispatch_timeout().map(|t| t.as_millis() as u64),
    }))
}

/// POST /dispatch: route one wire message through the kernel.
///
/// Request body: `<promise> <parm> ... [\n\n<payload>]`
/// Response body: the bytes returned by the module that handled it.
async fn dispatch_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    match state.kernel.dispatch(&body).await {
        Ok(output) => Ok((
            [(header::CONTENT_TYPE, "application/octet-stream")],
            output,
        )),
        Err(e) => {
            tracing::debug!("Dispatch failed: {}", e);
            Err(error_response(&e))
        }
    }
}

/// GET /routes: the syscall trie's populated paths.
async fn routes_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "routes": state.kernel.routes() }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
