//! Inbound wrappers: request handlers and message subscribers.

use std::sync::Arc;

use rpcmeter_core::{Error, Instrument, MetricGroup};
use rpcmeter_proto::{
    handler_fn, subscriber_fn, HandlerFunc, HandlerWrapper, SubscriberFunc, SubscriberWrapper,
};

use crate::options::WrapperOptions;

fn handler_wrapper(instrument: Instrument) -> HandlerWrapper {
    Arc::new(move |next: HandlerFunc| -> HandlerFunc {
        let instrument = instrument.clone();
        handler_fn(move |ctx, req, rsp| {
            let endpoint = req.endpoint().to_string();
            Box::pin(instrument.start(endpoint).track(next(ctx, req, rsp)))
        })
    })
}

fn subscriber_wrapper(instrument: Instrument) -> SubscriberWrapper {
    Arc::new(move |next: SubscriberFunc| -> SubscriberFunc {
        let instrument = instrument.clone();
        subscriber_fn(move |ctx, msg| {
            let topic = msg.topic().to_string();
            Box::pin(instrument.start(topic).track(next(ctx, msg)))
        })
    })
}

/// Wrap request handlers. Records into the server families, labelled with
/// the request endpoint.
///
/// A registration failure is logged and terminates the process.
pub fn new_handler_wrapper(opts: WrapperOptions) -> HandlerWrapper {
    handler_wrapper(opts.instrument(MetricGroup::Server))
}

/// Like [`new_handler_wrapper`], returning registration failures.
pub fn try_new_handler_wrapper(opts: WrapperOptions) -> Result<HandlerWrapper, Error> {
    Ok(handler_wrapper(opts.try_instrument(MetricGroup::Server)?))
}

/// Wrap message subscribers. Records into the subscribe families, labelled
/// with the message topic.
///
/// A registration failure is logged and terminates the process.
pub fn new_subscriber_wrapper(opts: WrapperOptions) -> SubscriberWrapper {
    subscriber_wrapper(opts.instrument(MetricGroup::Subscribe))
}

/// Like [`new_subscriber_wrapper`], returning registration failures.
pub fn try_new_subscriber_wrapper(opts: WrapperOptions) -> Result<SubscriberWrapper, Error> {
    Ok(subscriber_wrapper(
        opts.try_instrument(MetricGroup::Subscribe)?,
    ))
}
