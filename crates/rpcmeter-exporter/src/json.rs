//! JSON response types.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Exporter version.
    pub version: String,
    /// Family groups registered so far (`client`, `server`, ...).
    pub registered_groups: Vec<String>,
    /// Number of metric families with at least one series.
    pub families: usize,
}
