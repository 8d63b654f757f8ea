//! Client routed to a [`LocalServer`].

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;

use rpcmeter_proto::{
    call_func, chain_call, BoxFuture, CallFunc, CallOptions, Client, Context, Error, Message,
    PublishOptions, Request, Response, RpcRequest, Stream,
};

use crate::config::LocalClientConfig;
use crate::server::LocalServer;

/// A [`Client`] that dispatches straight into a [`LocalServer`].
///
/// Calls go through the configured call wrapper chain. Each call is bounded
/// by the request timeout from its call options and abandoned as soon as its
/// context is cancelled or passes its deadline.
pub struct LocalClient {
    config: LocalClientConfig,
    server: Arc<LocalServer>,
    call: CallFunc,
}

impl LocalClient {
    /// Create a client for `server`.
    pub fn new(server: Arc<LocalServer>, config: LocalClientConfig) -> Self {
        let base = {
            let server = server.clone();
            call_func(move |ctx, _address, req, rsp, _opts| {
                let server = server.clone();
                Box::pin(async move { server.dispatch(ctx, req, rsp).await })
            })
        };
        let call = chain_call(base, &config.call_wrappers);

        Self {
            config,
            server,
            call,
        }
    }

    /// The server this client dispatches into.
    pub fn server(&self) -> &Arc<LocalServer> {
        &self.server
    }
}

impl Client for LocalClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn call<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        rsp: &'a mut Response,
        opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<(), Error>> {
        let address = opts
            .address
            .first()
            .map(String::as_str)
            .unwrap_or(&self.config.address);

        Box::pin(async move {
            let call = (self.call)(ctx, address, req, rsp, opts);
            ctx.run(async move {
                match tokio::time::timeout(opts.request_timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout),
                }
            })
            .await
        })
    }

    fn stream<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        _opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Stream>, Error>> {
        Box::pin(async move {
            if let Some(err) = ctx.err() {
                return Err(err);
            }
            if req.service() != self.server.name() || !self.server.has_endpoint(req.endpoint()) {
                return Err(Error::NotFound(format!(
                    "{}.{}",
                    req.service(),
                    req.endpoint()
                )));
            }

            let stream: Box<dyn Stream> = Box::new(LocalStream {
                server: self.server.clone(),
                ctx: ctx.clone(),
                service: req.service().to_string(),
                endpoint: req.endpoint().to_string(),
                content_type: req.content_type().to_string(),
                responses: VecDeque::new(),
                closed: false,
            });
            Ok(stream)
        })
    }

    fn publish<'a>(
        &'a self,
        ctx: &'a Context,
        msg: &'a dyn Message,
        _opts: &'a PublishOptions,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move { self.server.deliver(ctx, msg).await.map(|_| ()) })
    }
}

impl std::fmt::Debug for LocalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Bidirectional stream over a local endpoint.
///
/// Every sent frame is dispatched as its own request; responses queue up
/// until received.
pub struct LocalStream {
    server: Arc<LocalServer>,
    ctx: Context,
    service: String,
    endpoint: String,
    content_type: String,
    responses: VecDeque<Bytes>,
    closed: bool,
}

impl Stream for LocalStream {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send<'a>(&'a mut self, body: Bytes) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if self.closed {
                return Err(Error::StreamClosed);
            }

            let req = RpcRequest::new(&self.service, &self.endpoint)
                .with_content_type(&self.content_type)
                .with_body(body);
            let mut rsp = Response::new();
            self.server.dispatch(&self.ctx, &req, &mut rsp).await?;
            self.responses.push_back(rsp.body);
            Ok(())
        })
    }

    fn recv<'a>(&'a mut self) -> BoxFuture<'a, Result<Option<Bytes>, Error>> {
        Box::pin(async move {
            match self.responses.pop_front() {
                Some(body) => Ok(Some(body)),
                None if self.closed => Err(Error::StreamClosed),
                None => Ok(None),
            }
        })
    }

    fn close(&mut self) -> Result<(), Error> {
        self.closed = true;
        Ok(())
    }
}
