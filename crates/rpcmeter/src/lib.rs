//! rpcmeter - Prometheus instrumentation for RPC and pub/sub call paths.
//!
//! Each wrapper constructor returns a decorator that counts every invocation
//! by outcome and observes its latency, then passes the result through
//! unchanged.
//!
//! | Wrapper | Families | Endpoint label |
//! |---|---|---|
//! | [`new_client_wrapper`] | client, publish | `service.endpoint` / topic |
//! | [`new_call_wrapper`] | client | `service.endpoint` |
//! | [`new_handler_wrapper`] | server | request endpoint |
//! | [`new_subscriber_wrapper`] | subscribe | message topic |
//!
//! # Quick Start
//!
//! ```ignore
//! use rpcmeter::{new_client_wrapper, new_handler_wrapper, WrapperOptions};
//!
//! let opts = WrapperOptions::new()
//!     .with_name("greeter")
//!     .with_version("1.0.0")
//!     .with_id("greeter-1");
//!
//! let client = rpcmeter::proto::chain_client(client, &[new_client_wrapper(opts.clone())]);
//! let handler = rpcmeter::proto::chain_handler(handler, &[new_handler_wrapper(opts)]);
//!
//! // Scrape
//! let text = rpcmeter::MetricsRegistry::global().encode_text()?;
//! ```

pub mod client;
pub mod options;
pub mod server;

pub use client::{
    client_endpoint, new_call_wrapper, new_client_wrapper, try_new_call_wrapper,
    try_new_client_wrapper, MeteredClient,
};
pub use options::WrapperOptions;
pub use server::{
    new_handler_wrapper, new_subscriber_wrapper, try_new_handler_wrapper,
    try_new_subscriber_wrapper,
};

pub use rpcmeter_core::{
    set_default_label_prefix, set_default_metric_prefix, Error, FamilySet, Identity, Instrument,
    MetricGroup, MetricsRegistry, Naming, Status,
};

pub use rpcmeter_core::naming::{DEFAULT_LABEL_PREFIX, DEFAULT_METRIC_PREFIX};

/// Re-export protocol types.
pub use rpcmeter_proto as proto;
