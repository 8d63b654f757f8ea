//! Registry adapter.
//!
//! Wraps a `prometheus::Registry` and hands out one [`FamilySet`] per
//! [`MetricGroup`]. Families are created and registered at most once per
//! adapter; later callers get the same instances.
//!
//! Several adapters may sit over the same registry (for example
//! [`MetricsRegistry::global`] and an adapter built over a clone of the
//! default registry). The first one to register a group owns its families and
//! every later adapter on that registry reuses them, so observations from
//! either side land in the same series. Each adapter plants an empty marker
//! collector on its registry; an adapter that hits `AlreadyReg` finds the
//! owner by checking which marker its own registry already holds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Registry, TextEncoder};

use crate::error::Error;
use crate::family::{FamilySet, MetricGroup};
use crate::naming::Naming;
use crate::proto::Context;

static GLOBAL: OnceLock<Arc<MetricsRegistry>> = OnceLock::new();

/// Family sets registered by any adapter in the process.
static OWNERS: LazyLock<Mutex<Vec<Owner>>> = LazyLock::new(|| Mutex::new(Vec::new()));

static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(1);

struct Owner {
    marker: AdapterMarker,
    naming: Naming,
    families: Arc<FamilySet>,
}

/// Collector that exports nothing; its descriptor identifies one adapter.
#[derive(Clone)]
struct AdapterMarker {
    desc: Desc,
}

impl AdapterMarker {
    fn new(adapter_id: u64) -> Result<Self, prometheus::Error> {
        let desc = Desc::new(
            format!("rpcmeter_adapter_marker_{}", adapter_id),
            "rpcmeter adapter identity".to_string(),
            Vec::new(),
            HashMap::new(),
        )?;
        Ok(Self { desc })
    }

    fn name(&self) -> &str {
        &self.desc.fq_name
    }
}

impl Collector for AdapterMarker {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        Vec::new()
    }
}

/// Creates, registers and caches family sets on a Prometheus registry.
pub struct MetricsRegistry {
    registry: Registry,
    naming: Option<Naming>,
    slots: [OnceLock<Arc<FamilySet>>; 4],
    adapter_id: u64,
    marker: OnceLock<AdapterMarker>,
    lock: Mutex<()>,
}

impl MetricsRegistry {
    /// Adapter over `registry`, using the process-wide prefixes.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            naming: None,
            slots: Default::default(),
            adapter_id: NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed),
            marker: OnceLock::new(),
            lock: Mutex::new(()),
        }
    }

    /// Pin the prefixes used by this adapter instead of the process-wide ones.
    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Adapter over the default Prometheus registry.
    pub fn global() -> Arc<Self> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::new(prometheus::default_registry().clone())))
            .clone()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Family set of `group` if it has been registered.
    pub fn families(&self, group: MetricGroup) -> Option<Arc<FamilySet>> {
        self.slots[group.index()].get().cloned()
    }

    /// Create and register the families of `group`, once.
    ///
    /// When another adapter over the same registry already registered the
    /// group, its families are returned instead. A family registered with the
    /// same descriptor by some other component counts as success; in that
    /// case the families returned here are not the ones exported.
    pub fn try_ensure(&self, group: MetricGroup) -> Result<Arc<FamilySet>, Error> {
        if let Some(families) = self.families(group) {
            return Ok(families);
        }

        let _guard = self.lock.lock();
        let slot = &self.slots[group.index()];
        if let Some(families) = slot.get() {
            return Ok(families.clone());
        }

        let naming = match &self.naming {
            Some(naming) => naming.clone(),
            None => Naming::current(),
        };
        let built = Arc::new(FamilySet::build(group, &naming)?);
        let families = self.register(built, naming)?;
        let families = slot.get_or_init(|| families).clone();

        tracing::debug!(group = group.as_str(), names = ?families.names(), "registered metric families");

        Ok(families)
    }

    fn register(&self, built: Arc<FamilySet>, naming: Naming) -> Result<Arc<FamilySet>, Error> {
        let mut owners = OWNERS.lock();
        let marker = self.plant_marker()?;

        let mut registered: Vec<String> = Vec::new();
        let mut taken = false;
        for (name, collector) in built.collectors() {
            match self.registry.register(collector) {
                Ok(()) => registered.push(name.to_string()),
                Err(prometheus::Error::AlreadyReg) => taken = true,
                Err(source) => {
                    let family = name.to_string();
                    self.rollback(&built, &registered);
                    return Err(Error::Registration { family, source });
                }
            }
        }

        if taken {
            let existing = owners
                .iter()
                .filter(|owner| {
                    owner.families.group() == built.group()
                        && owner.naming == naming
                        && owner.families.names() == built.names()
                })
                .find(|owner| self.holds(&owner.marker))
                .map(|owner| owner.families.clone());
            match existing {
                Some(existing) => {
                    self.rollback(&built, &registered);
                    return Ok(existing);
                }
                None => {
                    tracing::debug!(
                        group = built.group().as_str(),
                        "families already registered outside rpcmeter"
                    );
                    return Ok(built);
                }
            }
        }

        owners.push(Owner {
            marker,
            naming,
            families: built.clone(),
        });
        Ok(built)
    }

    fn plant_marker(&self) -> Result<AdapterMarker, Error> {
        if let Some(marker) = self.marker.get() {
            return Ok(marker.clone());
        }
        let marker = AdapterMarker::new(self.adapter_id)?;
        match self.registry.register(Box::new(marker.clone())) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(source) => {
                return Err(Error::Registration {
                    family: marker.name().to_string(),
                    source,
                });
            }
        }
        Ok(self.marker.get_or_init(|| marker).clone())
    }

    /// Whether this adapter's registry is the one `marker` was planted on.
    ///
    /// Must be called with the owner table locked.
    fn holds(&self, marker: &AdapterMarker) -> bool {
        match self.registry.register(Box::new(marker.clone())) {
            Err(prometheus::Error::AlreadyReg) => true,
            Ok(()) => {
                if let Err(err) = self.registry.unregister(Box::new(marker.clone())) {
                    tracing::debug!(marker = marker.name(), error = %err, "failed to remove marker");
                }
                false
            }
            Err(_) => false,
        }
    }

    fn rollback(&self, families: &FamilySet, registered: &[String]) {
        for (name, collector) in families.collectors() {
            if registered.iter().any(|r| r == name) {
                if let Err(err) = self.registry.unregister(collector) {
                    tracing::debug!(family = name, error = %err, "failed to roll back registration");
                }
            }
        }
    }

    /// Like [`try_ensure`](Self::try_ensure), but a registration failure
    /// is logged and terminates the process with exit status 1.
    pub fn ensure(&self, group: MetricGroup, ctx: &Context) -> Arc<FamilySet> {
        match self.try_ensure(group) {
            Ok(families) => families,
            Err(err) => {
                tracing::error!(
                    group = group.as_str(),
                    metadata = ?ctx.metadata_map(),
                    error = %err,
                    "metric registration failed"
                );
                std::process::exit(1);
            }
        }
    }

    /// Gather every family on the underlying registry.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition of the underlying registry.
    pub fn encode_text(&self) -> Result<String, Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.gather(), &mut buffer)
            .map_err(|e| Error::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| Error::Encoding(e.to_string()))
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered: Vec<&str> = MetricGroup::ALL
            .iter()
            .filter(|group| self.slots[group.index()].get().is_some())
            .map(|group| group.as_str())
            .collect();
        f.debug_struct("MetricsRegistry")
            .field("adapter_id", &self.adapter_id)
            .field("naming", &self.naming)
            .field("registered", &registered)
            .finish()
    }
}
