//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub canvas: String,
    pub auth: String,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Readiness probe. An unconfigured Canvas upstream still serves traffic
/// (every proxy call answers 500), so the server reports ready either way.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let canvas_ok = state.canvas.is_configured();

    let auth_status = match &state.provider {
        Some(provider) => provider.name().to_string(),
        None => "disabled".to_string(),
    };

    Json(HealthResponse {
        status: if canvas_ok { "healthy" } else { "degraded" }.to_string(),
        canvas: if canvas_ok { "ok" } else { "unconfigured" }.to_string(),
        auth: auth_status,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
