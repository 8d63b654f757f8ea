//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use rpcmeter::MetricGroup;

use crate::json::HealthResponse;
use crate::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registered_groups = MetricGroup::ALL
        .iter()
        .filter(|group| state.metrics.families(**group).is_some())
        .map(|group| group.as_str().to_string())
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        registered_groups,
        families: state.metrics.gather().len(),
    })
}
