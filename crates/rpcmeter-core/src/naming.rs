//! Metric and label name prefixes.
//!
//! The process-wide defaults are read when a family set is first built.
//! Changing them afterwards does not rename families that already exist.

use std::sync::LazyLock;

use parking_lot::RwLock;

/// Default prefix for metric names.
pub const DEFAULT_METRIC_PREFIX: &str = "micro_";

/// Default prefix for label names.
pub const DEFAULT_LABEL_PREFIX: &str = "micro_";

static DEFAULTS: LazyLock<RwLock<Naming>> = LazyLock::new(|| RwLock::new(Naming::default()));

/// Set the process-wide metric name prefix.
pub fn set_default_metric_prefix(prefix: impl Into<String>) {
    DEFAULTS.write().metric_prefix = prefix.into();
}

/// Set the process-wide label name prefix.
pub fn set_default_label_prefix(prefix: impl Into<String>) {
    DEFAULTS.write().label_prefix = prefix.into();
}

/// Prefixes applied to metric and label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    /// Prepended to every metric name.
    pub metric_prefix: String,
    /// Prepended to every label name.
    pub label_prefix: String,
}

impl Naming {
    /// Explicit prefixes.
    pub fn new(metric_prefix: impl Into<String>, label_prefix: impl Into<String>) -> Self {
        Self {
            metric_prefix: metric_prefix.into(),
            label_prefix: label_prefix.into(),
        }
    }

    /// Snapshot of the current process-wide defaults.
    pub fn current() -> Self {
        DEFAULTS.read().clone()
    }

    /// Full metric name for `suffix`.
    pub fn metric_name(&self, suffix: &str) -> String {
        format!("{}{}", self.metric_prefix, suffix)
    }

    /// Full label name for `label`.
    pub fn label_name(&self, label: &str) -> String {
        format!("{}{}", self.label_prefix, label)
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(DEFAULT_METRIC_PREFIX, DEFAULT_LABEL_PREFIX)
    }
}
