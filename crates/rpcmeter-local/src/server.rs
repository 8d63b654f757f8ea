//! In-process server: endpoint dispatch and topic fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use rpcmeter_proto::{
    chain_handler, chain_subscriber, Context, HandlerFunc, Message, Request, Response,
    SubscriberFunc,
};

use crate::config::LocalServerConfig;
use crate::error::Error;
use crate::subscription::SubscriptionEntry;

/// Routes requests to registered handlers and messages to subscribers.
///
/// Handlers and subscribers are wrapped with the configured wrapper chains
/// when they are registered, so every dispatch goes through them.
pub struct LocalServer {
    config: LocalServerConfig,
    /// Wrapped handlers keyed by endpoint.
    handlers: DashMap<String, HandlerFunc>,
    /// Active subscriptions keyed by subscription ID.
    subscriptions: RwLock<HashMap<u64, Arc<SubscriptionEntry>>>,
    /// Index of subscriptions by topic.
    topic_index: RwLock<HashMap<String, Vec<u64>>>,
    next_subscription_id: AtomicU64,
}

impl LocalServer {
    /// Create a server.
    pub fn new(config: LocalServerConfig) -> Self {
        Self {
            config,
            handlers: DashMap::new(),
            subscriptions: RwLock::new(HashMap::new()),
            topic_index: RwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Register `handler` for `endpoint`, replacing any previous one.
    pub fn handle(&self, endpoint: impl Into<String>, handler: HandlerFunc) {
        let endpoint = endpoint.into();
        let wrapped = chain_handler(handler, &self.config.handler_wrappers);
        tracing::debug!(service = %self.config.name, endpoint = %endpoint, "handler registered");
        self.handlers.insert(endpoint, wrapped);
    }

    /// Whether a handler is registered for `endpoint`.
    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        self.handlers.contains_key(endpoint)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Route `req` to its handler.
    pub async fn dispatch(
        &self,
        ctx: &Context,
        req: &dyn Request,
        rsp: &mut Response,
    ) -> Result<(), rpcmeter_proto::Error> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let handler = self.route(req)?;
        ctx.run(handler(ctx, req, rsp)).await
    }

    fn route(&self, req: &dyn Request) -> Result<HandlerFunc, rpcmeter_proto::Error> {
        let found = if req.service() == self.config.name {
            self.handlers.get(req.endpoint()).map(|h| h.value().clone())
        } else {
            None
        };

        found.ok_or_else(|| {
            tracing::debug!(
                service = %req.service(),
                endpoint = %req.endpoint(),
                "no handler for endpoint"
            );
            rpcmeter_proto::Error::NotFound(format!("{}.{}", req.service(), req.endpoint()))
        })
    }

    /// Subscribe `subscriber` to `topic`.
    ///
    /// Returns the subscription ID.
    pub async fn subscribe(&self, topic: impl Into<String>, subscriber: SubscriberFunc) -> u64 {
        let topic = topic.into();
        let subscription_id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        let wrapped = chain_subscriber(subscriber, &self.config.subscriber_wrappers);
        let entry = Arc::new(SubscriptionEntry::new(subscription_id, &topic, wrapped));

        {
            let mut subs = self.subscriptions.write().await;
            subs.insert(subscription_id, entry);
        }

        {
            let mut index = self.topic_index.write().await;
            index.entry(topic.clone()).or_default().push(subscription_id);
        }

        tracing::debug!(subscription_id, topic = %topic, "subscription created");

        subscription_id
    }

    /// Remove a subscription.
    pub async fn unsubscribe(&self, subscription_id: u64) -> Result<(), Error> {
        let entry = {
            let mut subs = self.subscriptions.write().await;
            subs.remove(&subscription_id)
        };

        let entry = entry.ok_or(Error::SubscriptionNotFound(subscription_id))?;

        {
            let mut index = self.topic_index.write().await;
            if let Some(ids) = index.get_mut(&entry.topic) {
                ids.retain(|&id| id != subscription_id);
                if ids.is_empty() {
                    index.remove(&entry.topic);
                }
            }
        }

        tracing::debug!(
            subscription_id,
            topic = %entry.topic,
            delivered = entry.delivered(),
            "subscription removed"
        );

        Ok(())
    }

    /// Hand `msg` to every subscriber of its topic, in subscription order.
    ///
    /// Every subscriber is invoked even if an earlier one fails; the first
    /// error is returned. Returns the number of subscribers reached. Once the
    /// context is done, remaining subscribers fail with its error.
    pub async fn deliver(
        &self,
        ctx: &Context,
        msg: &dyn Message,
    ) -> Result<usize, rpcmeter_proto::Error> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        let entries = self.entries_for_topic(msg.topic()).await;

        let mut first_error = None;
        for entry in &entries {
            entry.record_delivery();
            if let Err(err) = ctx.run((entry.subscriber)(ctx, msg)).await {
                tracing::debug!(
                    subscription_id = entry.id,
                    topic = %entry.topic,
                    error = %err,
                    "subscriber failed"
                );
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(entries.len()),
        }
    }

    async fn entries_for_topic(&self, topic: &str) -> Vec<Arc<SubscriptionEntry>> {
        let ids = self.subscriptions_for_topic(topic).await;
        if ids.is_empty() {
            return Vec::new();
        }

        let subs = self.subscriptions.read().await;
        ids.iter().filter_map(|id| subs.get(id).cloned()).collect()
    }

    /// Get the number of active subscriptions.
    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    /// Get subscriptions for a specific topic.
    pub async fn subscriptions_for_topic(&self, topic: &str) -> Vec<u64> {
        let index = self.topic_index.read().await;
        index.get(topic).cloned().unwrap_or_default()
    }

    /// Get a subscription by ID.
    pub async fn get_subscription(&self, subscription_id: u64) -> Option<Arc<SubscriptionEntry>> {
        let subs = self.subscriptions.read().await;
        subs.get(&subscription_id).cloned()
    }
}

impl std::fmt::Debug for LocalServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalServer")
            .field("config", &self.config)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use rpcmeter_proto::{
        handler_fn, subscriber_fn, HandlerWrapper, RpcMessage, RpcRequest, SubscriberWrapper,
    };

    fn echo() -> HandlerFunc {
        handler_fn(|_ctx, req, rsp| {
            Box::pin(async move {
                rsp.set_body(req.body().clone());
                Ok(())
            })
        })
    }

    fn counting(counter: Arc<AtomicUsize>) -> SubscriberFunc {
        subscriber_fn(move |_ctx, _msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        })
    }

    #[tokio::test]
    async fn test_dispatch() {
        let server = LocalServer::new(LocalServerConfig::new("greeter"));
        server.handle("Greeter.Echo", echo());
        assert!(server.has_endpoint("Greeter.Echo"));
        assert_eq!(server.handler_count(), 1);

        let ctx = Context::background();
        let req = RpcRequest::new("greeter", "Greeter.Echo").with_body("ping");
        let mut rsp = Response::new();
        server.dispatch(&ctx, &req, &mut rsp).await.unwrap();
        assert_eq!(&rsp.body[..], b"ping");
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let server = LocalServer::new(LocalServerConfig::new("greeter"));
        server.handle("Greeter.Echo", echo());
        let ctx = Context::background();
        let mut rsp = Response::new();

        let missing = RpcRequest::new("greeter", "Greeter.Missing");
        assert_eq!(
            server.dispatch(&ctx, &missing, &mut rsp).await,
            Err(rpcmeter_proto::Error::NotFound(
                "greeter.Greeter.Missing".to_string()
            ))
        );

        let other_service = RpcRequest::new("billing", "Greeter.Echo");
        assert!(matches!(
            server.dispatch(&ctx, &other_service, &mut rsp).await,
            Err(rpcmeter_proto::Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_cancelled() {
        let server = LocalServer::new(LocalServerConfig::new("greeter"));
        server.handle("Greeter.Echo", echo());

        let ctx = Context::background();
        ctx.cancel();
        let req = RpcRequest::new("greeter", "Greeter.Echo");
        let mut rsp = Response::new();
        assert_eq!(
            server.dispatch(&ctx, &req, &mut rsp).await,
            Err(rpcmeter_proto::Error::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_dispatch_cancelled_in_flight() {
        let server = LocalServer::new(LocalServerConfig::new("greeter"));
        let finished = Arc::new(AtomicUsize::new(0));
        let done = finished.clone();
        server.handle(
            "Greeter.Slow",
            handler_fn(move |_ctx, _req, _rsp| {
                let done = done.clone();
                Box::pin(async move {
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
        );

        let ctx = Context::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let req = RpcRequest::new("greeter", "Greeter.Slow");
        let mut rsp = Response::new();
        assert_eq!(
            server.dispatch(&ctx, &req, &mut rsp).await,
            Err(rpcmeter_proto::Error::Cancelled)
        );
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_wrappers_applied() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let wrapper: HandlerWrapper = Arc::new(move |next: HandlerFunc| -> HandlerFunc {
            let seen = seen.clone();
            handler_fn(move |ctx, req, rsp| {
                seen.fetch_add(1, Ordering::SeqCst);
                next(ctx, req, rsp)
            })
        });

        let server = LocalServer::new(LocalServerConfig::new("greeter").with_handler_wrapper(wrapper));
        server.handle("Greeter.Echo", echo());

        let req = RpcRequest::new("greeter", "Greeter.Echo");
        let mut rsp = Response::new();
        server
            .dispatch(&Context::background(), &req, &mut rsp)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribe_and_deliver() {
        let server = LocalServer::new(LocalServerConfig::new("orders"));
        let counter = Arc::new(AtomicUsize::new(0));

        let first = server.subscribe("orders.created", counting(counter.clone())).await;
        let second = server.subscribe("orders.created", counting(counter.clone())).await;
        server.subscribe("orders.deleted", counting(counter.clone())).await;
        assert_ne!(first, second);
        assert_eq!(server.subscription_count().await, 3);
        assert_eq!(
            server.subscriptions_for_topic("orders.created").await,
            vec![first, second]
        );

        let msg = RpcMessage::new("orders.created", "{}");
        let reached = server.deliver(&Context::background(), &msg).await.unwrap();
        assert_eq!(reached, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(server.get_subscription(first).await.unwrap().delivered(), 1);

        let nobody = RpcMessage::new("orders.archived", "{}");
        assert_eq!(server.deliver(&Context::background(), &nobody).await, Ok(0));
    }

    #[tokio::test]
    async fn test_deliver_reports_first_error() {
        let server = LocalServer::new(LocalServerConfig::new("orders"));
        let counter = Arc::new(AtomicUsize::new(0));

        server
            .subscribe(
                "orders.created",
                subscriber_fn(|_ctx, _msg| {
                    Box::pin(async { Err(rpcmeter_proto::Error::internal("first")) })
                }),
            )
            .await;
        server.subscribe("orders.created", counting(counter.clone())).await;

        let msg = RpcMessage::new("orders.created", "{}");
        let result = server.deliver(&Context::background(), &msg).await;
        assert_eq!(result, Err(rpcmeter_proto::Error::internal("first")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let wrapper: SubscriberWrapper = Arc::new(move |next: SubscriberFunc| -> SubscriberFunc {
            let seen = seen.clone();
            subscriber_fn(move |ctx, msg| {
                seen.fetch_add(10, Ordering::SeqCst);
                next(ctx, msg)
            })
        });
        let server =
            LocalServer::new(LocalServerConfig::new("orders").with_subscriber_wrapper(wrapper));

        let id = server.subscribe("orders.created", counting(counter.clone())).await;
        let msg = RpcMessage::new("orders.created", "{}");
        server.deliver(&Context::background(), &msg).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 11);

        server.unsubscribe(id).await.unwrap();
        assert_eq!(server.subscription_count().await, 0);
        assert!(server.subscriptions_for_topic("orders.created").await.is_empty());
        assert!(matches!(
            server.unsubscribe(id).await,
            Err(Error::SubscriptionNotFound(_))
        ));
    }
}
