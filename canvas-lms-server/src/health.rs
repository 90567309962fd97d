//! Health check endpoints.
//!
//! - `/health/live` - Liveness check (the process is up)
//! - `/health/ready` - Readiness check (Canvas credentials resolved)
//! - `/health` - Same as readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Canvas credentials resolved and a client built
    pub canvas_credentials: bool,
    /// Why credentials are unusable, when they are
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_error: Option<String>,
}

/// Liveness check.
#[tracing::instrument(name = "liveness_check")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness check.
///
/// Not ready while tool calls would fail with a configuration error.
#[tracing::instrument(name = "readiness_check", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let configuration_error = state.mcp.configuration_error().map(ToString::to_string);
    let ready = configuration_error.is_none();

    let status = HealthStatus {
        status: if ready { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            canvas_credentials: ready,
            configuration_error,
        },
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}
