//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub sessions: usize,
    pub uptime_seconds: i64,
}

/// GET /health
///
/// No authentication and no rate limit.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let sessions = state.registry.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "booth-kiosk".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions,
        uptime_seconds: (chrono::Utc::now() - state.startup_time).num_seconds(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
