//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (room for another session)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe. The warehouse is not queried here since
/// every query is billed; readiness only reflects session capacity.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if has_capacity(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with session details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if has_capacity(&state).await {
        "healthy"
    } else {
        "saturated"
    };

    Json(HealthResponse {
        status: status.to_string(),
        warehouse_project: state.renderer.warehouse().project_id().to_string(),
        sessions: state.ws_connection_count().await,
        auto_refresh_sessions: state.ws_hub.auto_refresh_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn has_capacity(state: &AppState) -> bool {
    state.ws_connection_count().await < state.server.max_sessions
}
