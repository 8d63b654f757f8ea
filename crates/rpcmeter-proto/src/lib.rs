//! rpcmeter protocol contracts.
//!
//! This crate defines the narrow surface of the request/response and
//! publish/subscribe framework that rpcmeter instruments. Everything here is
//! transport-agnostic: a real framework implements these traits, and the
//! instrumentation wraps them without knowing what sits underneath.
//!
//! # Modules
//!
//! - [`context`] - Per-call execution context (deadline, cancellation, metadata)
//! - [`message`] - Request, message and response types
//! - [`options`] - Call and publish options
//! - [`client`] - The outbound `Client` and `Stream` capabilities
//! - [`func`] - Function capabilities and their wrapper types
//! - [`error`] - Framework error type
//!
//! # Wrapping
//!
//! ```ignore
//! use rpcmeter_proto::{chain_handler, handler_fn, HandlerFunc, Response};
//!
//! let hello: HandlerFunc = handler_fn(|_ctx, _req, rsp| {
//!     Box::pin(async move {
//!         rsp.set_body("hello");
//!         Ok(())
//!     })
//! });
//!
//! // The first wrapper in the list runs outermost.
//! let wrapped = chain_handler(hello, &[tracing_wrapper, metrics_wrapper]);
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod func;
pub mod message;
pub mod options;

pub use client::{Client, Stream};
pub use context::Context;
pub use error::Error;
pub use func::{
    call_func, chain_call, chain_client, chain_handler, chain_subscriber, handler_fn,
    subscriber_fn, CallFunc, CallWrapper, ClientWrapper, HandlerFunc, HandlerWrapper,
    SubscriberFunc, SubscriberWrapper,
};
pub use message::{Message, Request, Response, RpcMessage, RpcRequest, DEFAULT_CONTENT_TYPE};
pub use options::{CallOptions, PublishOptions};

/// Re-export of the boxed future type used by every async capability.
pub use futures::future::BoxFuture;
