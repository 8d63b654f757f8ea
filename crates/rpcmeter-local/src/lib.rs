//! rpcmeter-local - an in-process RPC server and client.
//!
//! [`LocalServer`] routes requests by endpoint and fans messages out by
//! topic; [`LocalClient`] implements [`rpcmeter_proto::Client`] on top of
//! it. Handler, subscriber and call wrapper chains are applied exactly where
//! a networked framework would apply them, so instrumentation can be
//! exercised without a transport.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use rpcmeter_local::{LocalClient, LocalClientConfig, LocalServer, LocalServerConfig};
//! use rpcmeter_proto::{handler_fn, Client, Context, CallOptions, Response, RpcRequest};
//!
//! let server = Arc::new(LocalServer::new(LocalServerConfig::new("greeter")));
//! server.handle("Greeter.Hello", handler_fn(|_ctx, _req, rsp| {
//!     Box::pin(async move {
//!         rsp.set_body("hello");
//!         Ok(())
//!     })
//! }));
//!
//! let client = LocalClient::new(server, LocalClientConfig::default());
//! let mut rsp = Response::new();
//! client
//!     .call(&Context::background(), &RpcRequest::new("greeter", "Greeter.Hello"), &mut rsp, &CallOptions::new())
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod subscription;

pub use client::{LocalClient, LocalStream};
pub use config::{LocalClientConfig, LocalServerConfig, DEFAULT_ADDRESS};
pub use error::Error;
pub use server::LocalServer;
pub use subscription::SubscriptionEntry;
