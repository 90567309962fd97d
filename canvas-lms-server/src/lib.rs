//! # Canvas LMS MCP Server Library
//!
//! Transports for the Canvas LMS MCP tools: line-delimited JSON-RPC over
//! stdio and a localhost HTTP endpoint. Used by the binary and integration tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use canvas_lms_mcp::{CanvasLmsMcpServer, JsonRpcRequest, DEFAULT_SCOPE};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod cli;
pub mod health;
pub mod metrics;
pub mod stdio;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 9474;

/// Header naming the client session; cancellations only reach calls from the same session.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// MCP server instance.
    pub mcp: Arc<CanvasLmsMcpServer>,
    /// Prometheus handle; `/metrics` is only routed when present.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State without a metrics exporter.
    #[must_use]
    pub fn new(mcp: Arc<CanvasLmsMcpServer>) -> Self {
        Self { mcp, metrics: None }
    }

    /// Attach a Prometheus handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/mcp", post(mcp_handler));

    if let Some(handle) = state.metrics.clone() {
        let metrics_router = Router::new()
            .route("/metrics", get(metrics::metrics_handler))
            .with_state(handle);
        app = app.merge(metrics_router);
    }

    app
        // Request ID for log correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// MCP JSON-RPC endpoint.
///
/// Protocol errors are answered in JSON-RPC form with status 200;
/// notifications get `202 Accepted` and no body.
#[tracing::instrument(name = "mcp_handler", skip(state, headers, body))]
async fn mcp_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match JsonRpcRequest::from_slice(&body) {
        Ok(request) => request,
        Err(response) => return Json(response).into_response(),
    };

    let scope = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_SCOPE);
    tracing::debug!(method = %request.method, session = scope, "Processing MCP request");
    match state.mcp.handle_scoped(scope, request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
