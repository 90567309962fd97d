//! Prometheus exporter for the `/metrics` endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return its handle.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
