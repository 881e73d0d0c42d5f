//! Health check endpoints.

use super::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use pollada_core::TicketStore;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Liveness check: 200 OK while the process is serving requests.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"ok","version":"0.1.0"}
/// ```
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Database connectivity
    pub database: bool,
}

/// Readiness check: 200 when the store answers, 503 otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/ready
/// # {"ready":true,"database":true}
/// ```
pub async fn readiness_check<S: TicketStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match state.office.ping().await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(%error, "Readiness check failed");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready: database,
            database,
        }),
    )
}
