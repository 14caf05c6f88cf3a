//! Health check endpoints
//!
//! Health endpoints for monitoring and container orchestration.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    // If we can respond, we're alive
    Json(LivenessResponse { alive: true })
}
