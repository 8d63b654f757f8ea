//! Outbound client capabilities.

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::Error;
use crate::message::{Message, Request, Response};
use crate::options::{CallOptions, PublishOptions};

/// A bidirectional stream opened by [`Client::stream`].
pub trait Stream: Send {
    /// Endpoint the stream was opened against.
    fn endpoint(&self) -> &str;

    /// Send a frame.
    fn send<'a>(&'a mut self, body: Bytes) -> BoxFuture<'a, Result<(), Error>>;

    /// Receive the next frame, or `None` when nothing is pending.
    fn recv<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Bytes>, Error>>;

    /// Close the stream. Further sends fail with [`Error::StreamClosed`].
    fn close(&mut self) -> Result<(), Error>;
}

/// The outbound capability set of a framework client.
///
/// Wrappers decorate a `Client` and return another `Client`, so every method
/// here must forward its arguments and result unchanged unless the wrapper
/// explicitly means to alter them.
pub trait Client: Send + Sync {
    /// Human-readable client name.
    fn name(&self) -> &str;

    /// Make a unary call, writing the reply into `rsp`.
    fn call<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        rsp: &'a mut Response,
        opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<(), Error>>;

    /// Open a stream to the request's endpoint.
    fn stream<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Stream>, Error>>;

    /// Publish a message to its topic.
    fn publish<'a>(
        &'a self,
        ctx: &'a Context,
        msg: &'a dyn Message,
        opts: &'a PublishOptions,
    ) -> BoxFuture<'a, Result<(), Error>>;
}
