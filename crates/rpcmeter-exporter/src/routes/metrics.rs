//! Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::AppState;

/// Scrape routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}

/// Text exposition of every family on the registry.
async fn scrape(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.encode_text()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
