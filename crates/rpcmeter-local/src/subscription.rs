//! Subscription tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use rpcmeter_proto::SubscriberFunc;

/// An active subscription.
pub struct SubscriptionEntry {
    /// Unique subscription ID.
    pub id: u64,
    /// Topic being watched.
    pub topic: String,
    /// Wrapped subscriber.
    pub subscriber: SubscriberFunc,
    /// When the subscription was created.
    pub created_at: Instant,
    delivered: AtomicU64,
}

impl SubscriptionEntry {
    /// Create a new subscription entry.
    pub fn new(id: u64, topic: impl Into<String>, subscriber: SubscriberFunc) -> Self {
        Self {
            id,
            topic: topic.into(),
            subscriber,
            created_at: Instant::now(),
            delivered: AtomicU64::new(0),
        }
    }

    /// Get the age of this subscription.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Number of messages handed to the subscriber.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub(crate) fn record_delivery(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for SubscriptionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionEntry")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("delivered", &self.delivered())
            .finish()
    }
}
