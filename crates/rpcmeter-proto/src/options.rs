//! Call and publish options.

use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of retries.
pub const DEFAULT_RETRIES: u32 = 1;

/// Options for a single outbound call or stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOptions {
    /// Explicit node addresses; empty means "let the client pick".
    pub address: Vec<String>,
    /// Timeout for the request.
    pub request_timeout: Duration,
    /// Number of retries on transport failure.
    pub retries: u32,
    /// Extra headers sent with the request.
    pub metadata: BTreeMap<String, String>,
}

impl CallOptions {
    /// Default call options.
    pub fn new() -> Self {
        Self {
            address: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retries: DEFAULT_RETRIES,
            metadata: BTreeMap::new(),
        }
    }

    /// Pin the call to an address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address.push(address.into());
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Add a header.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Options for a single publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Publish the raw payload without an envelope.
    pub body_only: bool,
    /// Exchange to publish through, if the broker has one.
    pub exchange: Option<String>,
    /// Extra headers sent with the message.
    pub metadata: BTreeMap<String, String>,
}

impl PublishOptions {
    /// Default publish options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the payload without an envelope.
    pub fn body_only(mut self) -> Self {
        self.body_only = true;
        self
    }

    /// Set the exchange.
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Add a header.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
