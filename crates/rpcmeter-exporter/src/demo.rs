//! Synthetic traffic through a fully instrumented in-process service.
//!
//! The demo greeter has a handler that succeeds with a variable delay, one
//! that always fails, and a subscriber on the `greetings` topic. Every tick
//! exercises calls, a stream and a publish through the wrapped client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rpcmeter::proto::{
    chain_client, handler_fn, subscriber_fn, CallOptions, Client, Context, Error, PublishOptions,
    Response, RpcMessage, RpcRequest,
};
use rpcmeter::{
    try_new_client_wrapper, try_new_handler_wrapper, try_new_subscriber_wrapper, WrapperOptions,
};
use rpcmeter_local::{LocalClient, LocalClientConfig, LocalServer, LocalServerConfig};

/// Service name of the demo greeter.
pub const DEMO_SERVICE: &str = "greeter";

/// Topic the demo publishes to.
pub const DEMO_TOPIC: &str = "greetings";

/// Every n-th tick calls the failing endpoint.
const FAIL_EVERY: u64 = 5;

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Operations attempted.
    pub attempted: usize,
    /// Operations that returned an error.
    pub failed: usize,
}

/// Instrumented client and server pair.
pub struct Demo {
    client: Arc<dyn Client>,
    server: Arc<LocalServer>,
    ticks: AtomicU64,
}

impl Demo {
    /// Build the demo service, registering its families through `opts`.
    pub async fn new(opts: WrapperOptions) -> Result<Self, rpcmeter::Error> {
        let server = LocalServer::new(
            LocalServerConfig::new(DEMO_SERVICE)
                .with_handler_wrapper(try_new_handler_wrapper(opts.clone())?)
                .with_subscriber_wrapper(try_new_subscriber_wrapper(opts.clone())?),
        );

        server.handle(
            "Greeter.Hello",
            handler_fn(|_ctx, req, rsp| {
                Box::pin(async move {
                    let delay = std::str::from_utf8(req.body())
                        .ok()
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(0)
                        % 20;
                    tokio::time::sleep(Duration::from_millis(1 + delay)).await;
                    rsp.set_body("hello");
                    Ok(())
                })
            }),
        );
        server.handle(
            "Greeter.Fail",
            handler_fn(|_ctx, _req, _rsp| {
                Box::pin(async { Err(Error::status(503, "greeter overloaded")) })
            }),
        );
        let server = Arc::new(server);
        server
            .subscribe(
                DEMO_TOPIC,
                subscriber_fn(|_ctx, msg| {
                    let size = msg.payload().len();
                    Box::pin(async move {
                        tracing::trace!(size, "greeting received");
                        Ok(())
                    })
                }),
            )
            .await;

        let base: Arc<dyn Client> = Arc::new(LocalClient::new(
            server.clone(),
            LocalClientConfig::new("demo-client"),
        ));
        let client = chain_client(base, &[try_new_client_wrapper(opts)?]);

        Ok(Self {
            client,
            server,
            ticks: AtomicU64::new(0),
        })
    }

    /// The in-process server.
    pub fn server(&self) -> &Arc<LocalServer> {
        &self.server
    }

    /// Run one round of traffic.
    pub async fn tick(&self) -> TickReport {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let ctx = Context::background().with_metadata("demo-tick", tick.to_string());
        let opts = CallOptions::new();
        let mut results = Vec::with_capacity(4);

        let hello = RpcRequest::new(DEMO_SERVICE, "Greeter.Hello").with_body(tick.to_string());
        let mut rsp = Response::new();
        results.push(self.client.call(&ctx, &hello, &mut rsp, &opts).await);

        if tick % FAIL_EVERY == 0 {
            let fail = RpcRequest::new(DEMO_SERVICE, "Greeter.Fail");
            let mut rsp = Response::new();
            results.push(self.client.call(&ctx, &fail, &mut rsp, &opts).await);
        }

        results.push(self.stream_once(&ctx, &hello, &opts).await);

        let msg = RpcMessage::new(DEMO_TOPIC, format!("hello #{}", tick));
        results.push(
            self.client
                .publish(&ctx, &msg, &PublishOptions::new())
                .await,
        );

        let report = TickReport {
            attempted: results.len(),
            failed: results.iter().filter(|r| r.is_err()).count(),
        };
        tracing::debug!(tick, attempted = report.attempted, failed = report.failed, "demo tick");
        report
    }

    async fn stream_once(
        &self,
        ctx: &Context,
        req: &RpcRequest,
        opts: &CallOptions,
    ) -> Result<(), Error> {
        let mut stream = self.client.stream(ctx, req, opts).await?;
        stream.send(Bytes::from_static(b"0")).await?;
        stream.recv().await?;
        stream.close()
    }

    /// Tick every `interval` until the task is dropped.
    pub async fn run(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(interval_ms = interval.as_millis() as u64, "demo traffic started");
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}
