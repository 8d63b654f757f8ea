//! Error handling for the exporter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Metrics could not be gathered or encoded.
    Metrics(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Metrics(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "METRICS_ERROR", msg),
        };

        tracing::warn!(code, message = %message, "request failed");

        let body = ErrorResponse {
            error: true,
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<rpcmeter::Error> for AppError {
    fn from(err: rpcmeter::Error) -> Self {
        AppError::Metrics(err.to_string())
    }
}
