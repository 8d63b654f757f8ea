//! Local server and client configuration.

use rpcmeter_proto::{CallWrapper, HandlerWrapper, SubscriberWrapper};

/// Default address reported to call functions.
pub const DEFAULT_ADDRESS: &str = "local";

/// Local server configuration.
#[derive(Clone, Default)]
pub struct LocalServerConfig {
    /// Service name requests must address.
    pub name: String,

    /// Applied to every handler at registration; the first is outermost.
    pub handler_wrappers: Vec<HandlerWrapper>,

    /// Applied to every subscriber at subscription; the first is outermost.
    pub subscriber_wrappers: Vec<SubscriberWrapper>,
}

impl LocalServerConfig {
    /// Create a configuration for the service `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a handler wrapper.
    pub fn with_handler_wrapper(mut self, wrapper: HandlerWrapper) -> Self {
        self.handler_wrappers.push(wrapper);
        self
    }

    /// Add a subscriber wrapper.
    pub fn with_subscriber_wrapper(mut self, wrapper: SubscriberWrapper) -> Self {
        self.subscriber_wrappers.push(wrapper);
        self
    }
}

impl std::fmt::Debug for LocalServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalServerConfig")
            .field("name", &self.name)
            .field("handler_wrappers", &self.handler_wrappers.len())
            .field("subscriber_wrappers", &self.subscriber_wrappers.len())
            .finish()
    }
}

/// Local client configuration.
#[derive(Clone)]
pub struct LocalClientConfig {
    /// Client name.
    pub name: String,

    /// Address passed to the call function when the call options name none.
    pub address: String,

    /// Applied to the call function; the first is outermost.
    pub call_wrappers: Vec<CallWrapper>,
}

impl LocalClientConfig {
    /// Create a configuration with the given client name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: DEFAULT_ADDRESS.to_string(),
            call_wrappers: Vec::new(),
        }
    }

    /// Set the default address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Add a call wrapper.
    pub fn with_call_wrapper(mut self, wrapper: CallWrapper) -> Self {
        self.call_wrappers.push(wrapper);
        self
    }
}

impl Default for LocalClientConfig {
    fn default() -> Self {
        Self::new("local")
    }
}

impl std::fmt::Debug for LocalClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalClientConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("call_wrappers", &self.call_wrappers.len())
            .finish()
    }
}
