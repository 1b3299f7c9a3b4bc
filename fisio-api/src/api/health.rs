//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use fisio_common::wire::HEALTH_PATH;

use crate::AppState;

/// Liveness plus the strategy answering queries
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// "local" or "remote"
    pub source: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        source: state.source.kind().to_string(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route(HEALTH_PATH, get(health_check))
}
