//! Wrapper options.

use std::sync::Arc;

use rpcmeter_core::{Error, Identity, Instrument, MetricGroup, MetricsRegistry};
use rpcmeter_proto::Context;

/// Options shared by every wrapper constructor.
///
/// All fields are optional. Unset identity fields become empty label values,
/// the context defaults to [`Context::background`] and the registry to
/// [`MetricsRegistry::global`].
#[derive(Debug, Clone, Default)]
pub struct WrapperOptions {
    /// Service name label value.
    pub name: String,

    /// Service version label value.
    pub version: String,

    /// Service instance id label value.
    pub id: String,

    /// Context used when reporting registration failures.
    pub context: Context,

    /// Registry the families are created on. `None` means the global one.
    pub registry: Option<Arc<MetricsRegistry>>,
}

impl WrapperOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the service instance id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the context.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Record into `registry` instead of the global registry.
    pub fn with_registry(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The identity labels.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.name, &self.version, &self.id)
    }

    /// The registry wrappers built from these options record into.
    pub fn metrics_registry(&self) -> Arc<MetricsRegistry> {
        match &self.registry {
            Some(registry) => registry.clone(),
            None => MetricsRegistry::global(),
        }
    }

    pub(crate) fn instrument(&self, group: MetricGroup) -> Instrument {
        let families = self.metrics_registry().ensure(group, &self.context);
        Instrument::new(families, self.identity())
    }

    pub(crate) fn try_instrument(&self, group: MetricGroup) -> Result<Instrument, Error> {
        let families = self.metrics_registry().try_ensure(group)?;
        Ok(Instrument::new(families, self.identity()))
    }
}
