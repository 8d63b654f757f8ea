//! Framework error types.

use thiserror::Error;

/// Status code used for internal failures.
pub const INTERNAL_ERROR: u16 = 500;

/// Status code used for malformed requests.
pub const BAD_REQUEST: u16 = 400;

/// Errors surfaced by calls, streams, publishes, handlers and subscribers.
///
/// Instrumentation never produces these itself; it only passes them through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Application-level failure reported by the remote side.
    #[error("{detail} (code {code})")]
    Status { code: u16, detail: String },

    /// No handler is registered for the endpoint.
    #[error("endpoint not found: {0}")]
    NotFound(String),

    /// The call exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The call was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The stream was used after it was closed.
    #[error("stream closed")]
    StreamClosed,
}

impl Error {
    /// Create a status error with an explicit code.
    pub fn status(code: u16, detail: impl Into<String>) -> Self {
        Error::Status {
            code,
            detail: detail.into(),
        }
    }

    /// Create an internal status error.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::status(INTERNAL_ERROR, detail)
    }

    /// Create a bad-request status error.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::status(BAD_REQUEST, detail)
    }

    /// Whether this error came from the caller's context rather than the callee.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Timeout | Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = Error::internal("boom");
        assert_eq!(err.to_string(), "boom (code 500)");
        assert_eq!(
            Error::bad_request("missing field"),
            Error::Status {
                code: BAD_REQUEST,
                detail: "missing field".to_string()
            }
        );
    }

    #[test]
    fn test_context_errors() {
        assert!(Error::Timeout.is_context_error());
        assert!(Error::Cancelled.is_context_error());
        assert!(!Error::NotFound("Greeter.Hello".into()).is_context_error());
    }
}
