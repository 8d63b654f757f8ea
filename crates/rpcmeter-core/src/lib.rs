//! rpcmeter core - metric families and their registration.
//!
//! This crate owns everything that touches the metrics backend: the label
//! scheme, the four family groups, the summary collector, the registry
//! adapter that creates and registers families exactly once, and the
//! per-call observation guard used by the wrappers.

pub mod error;
pub mod family;
pub mod labels;
pub mod naming;
pub mod observe;
pub mod registry;
pub mod summary;

pub use error::Error;
pub use family::{FamilySet, MetricGroup};
pub use labels::{Identity, Status};
pub use naming::{set_default_label_prefix, set_default_metric_prefix, Naming};
pub use observe::{CallObservation, Instrument};
pub use registry::MetricsRegistry;
pub use summary::{Summary, SummaryOpts, SummaryVec};

/// Re-export protocol types.
pub use rpcmeter_proto as proto;
