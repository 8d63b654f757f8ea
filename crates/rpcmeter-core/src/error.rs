//! Core error types.

use thiserror::Error;

/// Metric definition and registration errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A family could not be registered for a reason other than already
    /// being registered with the same identity.
    #[error("failed to register metric family {family}: {source}")]
    Registration {
        family: String,
        #[source]
        source: prometheus::Error,
    },

    /// A family could not be constructed (invalid name or label set).
    #[error("invalid metric definition: {0}")]
    Definition(#[from] prometheus::Error),

    /// Gathered metrics could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),
}
