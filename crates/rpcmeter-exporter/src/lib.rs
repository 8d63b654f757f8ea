//! rpcmeter Prometheus exporter.
//!
//! Serves the families registered by rpcmeter wrappers over HTTP so a
//! Prometheus server can scrape them, and optionally drives synthetic
//! traffic through an instrumented in-process service.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /metrics` | Prometheus text exposition |
//! | `GET /health` | JSON health report |

pub mod config;
pub mod demo;
pub mod error;
pub mod json;
pub mod routes;

pub use config::{Args, ExporterConfig};
pub use demo::{Demo, TickReport};
pub use error::AppError;

use std::sync::Arc;

use axum::Router;
use rpcmeter::MetricsRegistry;
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Registry adapter being exported.
    pub metrics: Arc<MetricsRegistry>,
    /// Exporter configuration.
    pub config: ExporterConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(metrics: Arc<MetricsRegistry>, config: ExporterConfig) -> Self {
        Self { metrics, config }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::metrics::routes())
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
