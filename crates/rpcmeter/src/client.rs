//! Outbound wrappers: whole clients and the low-level call function.

use std::sync::Arc;

use rpcmeter_core::{Error, Instrument, MetricGroup};
use rpcmeter_proto::{
    call_func, BoxFuture, CallFunc, CallOptions, CallWrapper, Client, ClientWrapper, Context,
    Message, PublishOptions, Request, Response, Stream,
};

use crate::options::WrapperOptions;

/// Client endpoint label: `"{service}.{endpoint}"`.
pub fn client_endpoint(req: &dyn Request) -> String {
    format!("{}.{}", req.service(), req.endpoint())
}

/// A client whose calls, stream opens and publishes are observed.
///
/// Calls and streams record into the client families, publishes into the
/// publish families.
pub struct MeteredClient {
    inner: Arc<dyn Client>,
    calls: Instrument,
    publishes: Instrument,
}

impl MeteredClient {
    fn new(inner: Arc<dyn Client>, calls: Instrument, publishes: Instrument) -> Self {
        Self {
            inner,
            calls,
            publishes,
        }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &Arc<dyn Client> {
        &self.inner
    }
}

impl Client for MeteredClient {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn call<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        rsp: &'a mut Response,
        opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<(), rpcmeter_proto::Error>> {
        let endpoint = client_endpoint(req);
        Box::pin(
            self.calls
                .start(endpoint)
                .track(self.inner.call(ctx, req, rsp, opts)),
        )
    }

    // Latency covers opening the stream, not its lifetime.
    fn stream<'a>(
        &'a self,
        ctx: &'a Context,
        req: &'a dyn Request,
        opts: &'a CallOptions,
    ) -> BoxFuture<'a, Result<Box<dyn Stream>, rpcmeter_proto::Error>> {
        let endpoint = client_endpoint(req);
        Box::pin(
            self.calls
                .start(endpoint)
                .track(self.inner.stream(ctx, req, opts)),
        )
    }

    fn publish<'a>(
        &'a self,
        ctx: &'a Context,
        msg: &'a dyn Message,
        opts: &'a PublishOptions,
    ) -> BoxFuture<'a, Result<(), rpcmeter_proto::Error>> {
        let endpoint = msg.topic().to_string();
        Box::pin(
            self.publishes
                .start(endpoint)
                .track(self.inner.publish(ctx, msg, opts)),
        )
    }
}

fn client_wrapper(calls: Instrument, publishes: Instrument) -> ClientWrapper {
    Arc::new(move |inner: Arc<dyn Client>| -> Arc<dyn Client> {
        Arc::new(MeteredClient::new(inner, calls.clone(), publishes.clone()))
    })
}

fn call_wrapper(instrument: Instrument) -> CallWrapper {
    Arc::new(move |next: CallFunc| -> CallFunc {
        let instrument = instrument.clone();
        call_func(move |ctx, address, req, rsp, opts| {
            let endpoint = client_endpoint(req);
            Box::pin(
                instrument
                    .start(endpoint)
                    .track(next(ctx, address, req, rsp, opts)),
            )
        })
    })
}

/// Wrap whole clients.
///
/// Registers the client and publish families on first use. A registration
/// failure is logged and terminates the process; see
/// [`try_new_client_wrapper`] for a fallible variant.
pub fn new_client_wrapper(opts: WrapperOptions) -> ClientWrapper {
    let calls = opts.instrument(MetricGroup::Client);
    let publishes = opts.instrument(MetricGroup::Publish);
    client_wrapper(calls, publishes)
}

/// Like [`new_client_wrapper`], returning registration failures.
pub fn try_new_client_wrapper(opts: WrapperOptions) -> Result<ClientWrapper, Error> {
    let calls = opts.try_instrument(MetricGroup::Client)?;
    let publishes = opts.try_instrument(MetricGroup::Publish)?;
    Ok(client_wrapper(calls, publishes))
}

/// Wrap the low-level call function. Records into the client families.
pub fn new_call_wrapper(opts: WrapperOptions) -> CallWrapper {
    call_wrapper(opts.instrument(MetricGroup::Client))
}

/// Like [`new_call_wrapper`], returning registration failures.
pub fn try_new_call_wrapper(opts: WrapperOptions) -> Result<CallWrapper, Error> {
    Ok(call_wrapper(opts.try_instrument(MetricGroup::Client)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcmeter_core::{MetricsRegistry, Naming, Status};
    use rpcmeter_proto::RpcRequest;

    fn registry() -> Arc<MetricsRegistry> {
        Arc::new(MetricsRegistry::default().with_naming(Naming::default()))
    }

    #[test]
    fn test_client_endpoint() {
        let req = RpcRequest::new("greeter", "Greeter.Hello");
        assert_eq!(client_endpoint(&req), "greeter.Greeter.Hello");
    }

    #[tokio::test]
    async fn test_call_wrapper_records_client_family() {
        let registry = registry();
        let wrap = try_new_call_wrapper(
            WrapperOptions::new()
                .with_name("svc")
                .with_registry(registry.clone()),
        )
        .unwrap();

        let base = call_func(|_ctx, address, _req, rsp, _opts| {
            Box::pin(async move {
                rsp.set_body(address.to_string());
                Ok(())
            })
        });
        let call = wrap(base);

        let ctx = Context::background();
        let req = RpcRequest::new("greeter", "Greeter.Hello");
        let mut rsp = Response::new();
        call(&ctx, "10.0.0.1:8080", &req, &mut rsp, &CallOptions::new())
            .await
            .unwrap();
        assert_eq!(&rsp.body[..], b"10.0.0.1:8080");

        let families = registry.families(MetricGroup::Client).unwrap();
        let identity = rpcmeter_core::Identity::new("svc", "", "");
        let count = families
            .ops()
            .with_label_values(&identity.ops_values("greeter.Greeter.Hello", Status::Success))
            .get();
        assert_eq!(count, 1);
        // publish families are only needed by the client wrapper
        assert!(registry.families(MetricGroup::Publish).is_none());
    }
}
