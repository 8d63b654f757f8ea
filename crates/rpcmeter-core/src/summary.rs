//! Labelled latency summaries.
//!
//! The `prometheus` crate has no summary type, so this module provides one
//! as a custom [`Collector`]. Each child keeps lock-free fixed-bucket counts
//! and reports count and sum. Quantiles are off by default and exported only
//! when requested through [`SummaryOpts::quantiles`]; they are estimated from
//! the buckets rather than computed over a sliding window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use prometheus::core::{Collector, Desc};
use prometheus::proto::{self, LabelPair, MetricFamily, MetricType};

/// Bucket boundaries in microseconds used for quantile estimation.
///
/// 10us, 25us, 50us, ... 5s, 10s, 30s
pub const LATENCY_BOUNDS_US: [f64; 19] = [
    10.0,
    25.0,
    50.0,
    100.0,
    250.0,
    500.0,
    1_000.0,
    2_500.0,
    5_000.0,
    10_000.0,
    25_000.0,
    50_000.0,
    100_000.0,
    250_000.0,
    500_000.0,
    1_000_000.0,
    5_000_000.0,
    10_000_000.0,
    30_000_000.0,
];

/// A single summary child.
///
/// All operations are lock-free. Values are expected in the unit of the
/// bucket boundaries (microseconds by default).
pub struct Summary {
    /// Upper bucket boundaries.
    bounds: Vec<f64>,
    /// Non-cumulative counts per bucket, plus one overflow slot at the end.
    counts: Vec<AtomicU64>,
    /// Sum of observed values as `f64` bits.
    sum_bits: AtomicU64,
    /// Total count of observations.
    count: AtomicU64,
    /// Maximum observed value as `f64` bits.
    max_bits: AtomicU64,
}

impl Summary {
    /// Create a summary with the default latency bounds.
    pub fn latency() -> Self {
        Self::with_bounds(LATENCY_BOUNDS_US.to_vec())
    }

    /// Create a summary with explicit bucket bounds (ascending).
    pub fn with_bounds(bounds: Vec<f64>) -> Self {
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum_bits: AtomicU64::new(0f64.to_bits()),
            count: AtomicU64::new(0),
            max_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Record a value. Negative values are clamped to zero.
    pub fn observe(&self, value: f64) {
        let value = value.max(0.0);

        self.count.fetch_add(1, Ordering::Relaxed);
        update_f64(&self.sum_bits, |sum| sum + value);
        update_f64(&self.max_bits, |max| max.max(value));

        let slot = self
            .bounds
            .iter()
            .position(|&bound| value <= bound)
            .unwrap_or(self.bounds.len());
        self.counts[slot].fetch_add(1, Ordering::Relaxed);
    }

    /// Total count of observations.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of observed values.
    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Relaxed))
    }

    /// Largest observed value.
    pub fn max(&self) -> f64 {
        f64::from_bits(self.max_bits.load(Ordering::Relaxed))
    }

    /// Approximate quantile `q` in `[0, 1]`.
    ///
    /// Returns the upper boundary of the bucket holding the target rank,
    /// capped at the largest observed value. Zero when empty.
    pub fn quantile(&self, q: f64) -> f64 {
        let total = self.count();
        if total == 0 {
            return 0.0;
        }

        let target = ((total as f64 * q.clamp(0.0, 1.0)).ceil() as u64).max(1);
        let max = self.max();
        let mut cumulative = 0u64;

        for (i, count) in self.counts.iter().enumerate() {
            cumulative += count.load(Ordering::Relaxed);
            if cumulative >= target {
                return self.bounds.get(i).map_or(max, |&bound| bound.min(max));
            }
        }

        max
    }
}

impl Default for Summary {
    fn default() -> Self {
        Self::latency()
    }
}

fn update_f64(cell: &AtomicU64, f: impl Fn(f64) -> f64) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = f(f64::from_bits(current)).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

/// Options for a [`SummaryVec`].
#[derive(Debug, Clone)]
pub struct SummaryOpts {
    /// Fully-qualified metric name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Quantiles to report.
    pub quantiles: Vec<f64>,
    /// Bucket bounds used for quantile estimation.
    pub bounds: Vec<f64>,
}

impl SummaryOpts {
    /// Options with no quantiles and the latency bounds.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            quantiles: Vec::new(),
            bounds: LATENCY_BOUNDS_US.to_vec(),
        }
    }

    /// Set the reported quantiles.
    pub fn quantiles(mut self, quantiles: Vec<f64>) -> Self {
        self.quantiles = quantiles;
        self
    }

    /// Set the bucket bounds.
    pub fn bounds(mut self, bounds: Vec<f64>) -> Self {
        self.bounds = bounds;
        self
    }
}

struct SummaryVecCore {
    desc: Desc,
    opts: SummaryOpts,
    label_names: Vec<String>,
    children: RwLock<HashMap<Vec<String>, Arc<Summary>>>,
}

/// A summary partitioned by label values.
#[derive(Clone)]
pub struct SummaryVec {
    core: Arc<SummaryVecCore>,
}

impl SummaryVec {
    /// Create a summary vector. Fails if the name or label names are invalid.
    pub fn new(opts: SummaryOpts, label_names: &[&str]) -> prometheus::Result<Self> {
        let label_names: Vec<String> = label_names.iter().map(|name| name.to_string()).collect();
        let desc = Desc::new(
            opts.name.clone(),
            opts.help.clone(),
            label_names.clone(),
            HashMap::new(),
        )?;

        Ok(Self {
            core: Arc::new(SummaryVecCore {
                desc,
                opts,
                label_names,
                children: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Get or create the child for `values`, given in label-name order.
    pub fn get_metric_with_label_values(&self, values: &[&str]) -> prometheus::Result<Arc<Summary>> {
        if values.len() != self.core.label_names.len() {
            return Err(prometheus::Error::InconsistentCardinality {
                expect: self.core.label_names.len(),
                got: values.len(),
            });
        }

        let key: Vec<String> = values.iter().map(|value| value.to_string()).collect();
        if let Some(child) = self.core.children.read().get(&key) {
            return Ok(Arc::clone(child));
        }

        let mut children = self.core.children.write();
        let child = children
            .entry(key)
            .or_insert_with(|| Arc::new(Summary::with_bounds(self.core.opts.bounds.clone())));
        Ok(Arc::clone(child))
    }

    /// Get or create the child for `values`.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of label names,
    /// matching the behaviour of the `prometheus` vector types.
    pub fn with_label_values(&self, values: &[&str]) -> Arc<Summary> {
        match self.get_metric_with_label_values(values) {
            Ok(child) => child,
            Err(e) => panic!("summary {}: {}", self.core.opts.name, e),
        }
    }

    /// Number of label combinations observed so far.
    pub fn child_count(&self) -> usize {
        self.core.children.read().len()
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut family = MetricFamily::default();
        family.set_name(self.core.opts.name.clone());
        family.set_help(self.core.opts.help.clone());
        family.set_field_type(MetricType::SUMMARY);

        let children = self.core.children.read();
        let mut entries: Vec<_> = children.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (values, summary) in entries {
            let mut labels: Vec<LabelPair> = self
                .core
                .label_names
                .iter()
                .zip(values)
                .map(|(name, value)| {
                    let mut pair = LabelPair::default();
                    pair.set_name(name.clone());
                    pair.set_value(value.clone());
                    pair
                })
                .collect();
            labels.sort_by(|a, b| a.get_name().cmp(b.get_name()));

            let mut proto_summary = proto::Summary::default();
            proto_summary.set_sample_count(summary.count());
            proto_summary.set_sample_sum(summary.sum());
            for &q in &self.core.opts.quantiles {
                let mut quantile = proto::Quantile::default();
                quantile.set_quantile(q);
                quantile.set_value(summary.quantile(q));
                proto_summary.mut_quantile().push(quantile);
            }

            let mut metric = proto::Metric::default();
            for pair in labels {
                metric.mut_label().push(pair);
            }
            metric.set_summary(proto_summary);
            family.mut_metric().push(metric);
        }

        vec![family]
    }
}
