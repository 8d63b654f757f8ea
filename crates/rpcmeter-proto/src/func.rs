//! Function capabilities and wrapper types.
//!
//! Each capability is an `Arc`'d higher-ranked closure, so it can be cloned
//! into wrappers and invoked concurrently. Use the `*_fn` constructors to turn
//! a closure into a capability; they pin down the signature so the closure's
//! argument types are inferred.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::client::Client;
use crate::context::Context;
use crate::error::Error;
use crate::message::{Message, Request, Response};
use crate::options::CallOptions;

/// Low-level call: `(ctx, address, request, response, options)`.
pub type CallFunc = Arc<
    dyn for<'a> Fn(
            &'a Context,
            &'a str,
            &'a dyn Request,
            &'a mut Response,
            &'a CallOptions,
        ) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync,
>;

/// Inbound request handler: `(ctx, request, response)`.
pub type HandlerFunc = Arc<
    dyn for<'a> Fn(&'a Context, &'a dyn Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync,
>;

/// Inbound message subscriber: `(ctx, message)`.
pub type SubscriberFunc = Arc<
    dyn for<'a> Fn(&'a Context, &'a dyn Message) -> BoxFuture<'a, Result<(), Error>> + Send + Sync,
>;

/// Decorates a whole client.
pub type ClientWrapper = Arc<dyn Fn(Arc<dyn Client>) -> Arc<dyn Client> + Send + Sync>;

/// Decorates the low-level call function.
pub type CallWrapper = Arc<dyn Fn(CallFunc) -> CallFunc + Send + Sync>;

/// Decorates an inbound handler.
pub type HandlerWrapper = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// Decorates an inbound subscriber.
pub type SubscriberWrapper = Arc<dyn Fn(SubscriberFunc) -> SubscriberFunc + Send + Sync>;

/// Build a [`CallFunc`] from a closure.
pub fn call_func<F>(f: F) -> CallFunc
where
    F: for<'a> Fn(
            &'a Context,
            &'a str,
            &'a dyn Request,
            &'a mut Response,
            &'a CallOptions,
        ) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Build a [`HandlerFunc`] from a closure.
pub fn handler_fn<F>(f: F) -> HandlerFunc
where
    F: for<'a> Fn(&'a Context, &'a dyn Request, &'a mut Response) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Build a [`SubscriberFunc`] from a closure.
pub fn subscriber_fn<F>(f: F) -> SubscriberFunc
where
    F: for<'a> Fn(&'a Context, &'a dyn Message) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

// Wrappers are applied last-to-first so that `wrappers[0]` ends up outermost.

/// Apply client wrappers; the first wrapper is outermost.
pub fn chain_client(client: Arc<dyn Client>, wrappers: &[ClientWrapper]) -> Arc<dyn Client> {
    wrappers.iter().rev().fold(client, |inner, wrap| wrap(inner))
}

/// Apply call wrappers; the first wrapper is outermost.
pub fn chain_call(call: CallFunc, wrappers: &[CallWrapper]) -> CallFunc {
    wrappers.iter().rev().fold(call, |inner, wrap| wrap(inner))
}

/// Apply handler wrappers; the first wrapper is outermost.
pub fn chain_handler(handler: HandlerFunc, wrappers: &[HandlerWrapper]) -> HandlerFunc {
    wrappers.iter().rev().fold(handler, |inner, wrap| wrap(inner))
}

/// Apply subscriber wrappers; the first wrapper is outermost.
pub fn chain_subscriber(
    subscriber: SubscriberFunc,
    wrappers: &[SubscriberWrapper],
) -> SubscriberFunc {
    wrappers.iter().rev().fold(subscriber, |inner, wrap| wrap(inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RpcMessage, RpcRequest};
    use std::sync::Mutex;

    fn tagging_wrapper(tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> HandlerWrapper {
        Arc::new(move |inner: HandlerFunc| {
            let log = Arc::clone(&log);
            handler_fn(move |ctx, req, rsp| {
                let inner = Arc::clone(&inner);
                let log = Arc::clone(&log);
                Box::pin(async move {
                    log.lock().unwrap().push(tag);
                    inner(ctx, req, rsp).await
                })
            })
        })
    }

    #[tokio::test]
    async fn test_handler_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner_log = Arc::clone(&log);
        let handler = handler_fn(move |_ctx, req, rsp| {
            let log = Arc::clone(&inner_log);
            Box::pin(async move {
                log.lock().unwrap().push("handler");
                rsp.set_body(req.endpoint().to_string());
                Ok(())
            })
        });

        let wrapped = chain_handler(
            handler,
            &[
                tagging_wrapper("outer", Arc::clone(&log)),
                tagging_wrapper("inner", Arc::clone(&log)),
            ],
        );

        let ctx = Context::background();
        let req = RpcRequest::new("greeter", "Greeter.Hello");
        let mut rsp = Response::new();
        wrapped(&ctx, &req, &mut rsp).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner", "handler"]);
        assert_eq!(rsp.body.as_ref(), b"Greeter.Hello");
    }

    #[tokio::test]
    async fn test_empty_chain_is_identity() {
        let subscriber = subscriber_fn(|_ctx, msg| {
            let topic = msg.topic().to_string();
            Box::pin(async move { Err(Error::internal(topic)) })
        });
        let wrapped = chain_subscriber(subscriber, &[]);

        let ctx = Context::background();
        let msg = RpcMessage::new("events", "x");
        assert_eq!(wrapped(&ctx, &msg).await, Err(Error::internal("events")));
    }

    #[tokio::test]
    async fn test_call_func_forwards_address() {
        let call = call_func(|_ctx, address, _req, rsp, _opts| {
            let address = address.to_string();
            Box::pin(async move {
                rsp.set_body(address);
                Ok(())
            })
        });

        let ctx = Context::background();
        let req = RpcRequest::new("greeter", "Greeter.Hello");
        let mut rsp = Response::new();
        call(&ctx, "local://greeter", &req, &mut rsp, &CallOptions::default())
            .await
            .unwrap();

        assert_eq!(rsp.body.as_ref(), b"local://greeter");
    }
}
