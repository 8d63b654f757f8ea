//! Label scheme shared by every family.
//!
//! Ops counters carry `{name, version, id, endpoint, status}`; latency
//! families carry `{name, version, id, endpoint}`. Values are always produced
//! in that order by [`Identity`].

use crate::naming::Naming;

/// Service name label.
pub const LABEL_NAME: &str = "name";
/// Service version label.
pub const LABEL_VERSION: &str = "version";
/// Service instance id label.
pub const LABEL_ID: &str = "id";
/// Endpoint or topic label.
pub const LABEL_ENDPOINT: &str = "endpoint";
/// Outcome label, ops counters only.
pub const LABEL_STATUS: &str = "status";

/// Label names for ops counters.
pub fn ops_label_names(naming: &Naming) -> Vec<String> {
    [LABEL_NAME, LABEL_VERSION, LABEL_ID, LABEL_ENDPOINT, LABEL_STATUS]
        .iter()
        .map(|label| naming.label_name(label))
        .collect()
}

/// Label names for latency summaries and histograms.
pub fn latency_label_names(naming: &Naming) -> Vec<String> {
    [LABEL_NAME, LABEL_VERSION, LABEL_ID, LABEL_ENDPOINT]
        .iter()
        .map(|label| naming.label_name(label))
        .collect()
}

/// Outcome of a wrapped call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The call returned `Ok`.
    Success,
    /// The call returned `Err`, panicked, or was dropped before completing.
    Failure,
}

impl Status {
    /// Label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
        }
    }

    /// Classify a result.
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

/// Identity of the wrapped service: the first three label values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Service instance id.
    pub id: String,
}

impl Identity {
    /// Create an identity.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            id: id.into(),
        }
    }

    /// Label values for latency families.
    pub fn latency_values<'a>(&'a self, endpoint: &'a str) -> [&'a str; 4] {
        [self.name.as_str(), &self.version, &self.id, endpoint]
    }

    /// Label values for ops counters.
    pub fn ops_values<'a>(&'a self, endpoint: &'a str, status: Status) -> [&'a str; 5] {
        [
            self.name.as_str(),
            &self.version,
            &self.id,
            endpoint,
            status.as_str(),
        ]
    }
}
