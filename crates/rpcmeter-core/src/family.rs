//! Metric family groups.
//!
//! Every instrumented call shape belongs to one of four groups. A group owns
//! three families: an ops counter partitioned by status, a latency summary in
//! microseconds and a latency histogram in seconds.

use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

use crate::error::Error;
use crate::labels::{latency_label_names, ops_label_names, Identity, Status};
use crate::naming::Naming;
use crate::summary::{SummaryOpts, SummaryVec};

/// Instrumented call group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricGroup {
    /// Outbound calls, call functions and streams.
    Client,
    /// Inbound handlers.
    Server,
    /// Outbound publishes.
    Publish,
    /// Inbound subscriptions.
    Subscribe,
}

/// Names and help strings for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySpec {
    /// Ops counter name suffix.
    pub ops: &'static str,
    /// Ops counter help.
    pub ops_help: &'static str,
    /// Latency summary name suffix.
    pub summary: &'static str,
    /// Latency summary help.
    pub summary_help: &'static str,
    /// Latency histogram name suffix.
    pub histogram: &'static str,
    /// Latency histogram help.
    pub histogram_help: &'static str,
}

impl MetricGroup {
    /// All groups.
    pub const ALL: [MetricGroup; 4] = [
        MetricGroup::Client,
        MetricGroup::Server,
        MetricGroup::Publish,
        MetricGroup::Subscribe,
    ];

    /// Short name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::Client => "client",
            MetricGroup::Server => "server",
            MetricGroup::Publish => "publish",
            MetricGroup::Subscribe => "subscribe",
        }
    }

    /// Family names and help strings for this group.
    pub fn spec(&self) -> FamilySpec {
        match self {
            MetricGroup::Client => FamilySpec {
                ops: "request_total",
                ops_help: "Requests processed, partitioned by endpoint and status",
                summary: "latency_microseconds",
                summary_help: "Request latencies in microseconds, partitioned by endpoint",
                histogram: "request_duration_seconds",
                histogram_help: "Request time in seconds, partitioned by endpoint",
            },
            MetricGroup::Server => FamilySpec {
                ops: "server_request_total",
                ops_help: "Requests processed, partitioned by endpoint and status",
                summary: "server_latency_microseconds",
                summary_help: "Request latencies in microseconds, partitioned by endpoint",
                histogram: "server_request_duration_seconds",
                histogram_help: "Request time in seconds, partitioned by endpoint",
            },
            MetricGroup::Publish => FamilySpec {
                ops: "publish_message_total",
                ops_help: "Messages sent, partitioned by endpoint and status",
                summary: "publish_message_latency_microseconds",
                summary_help: "Message latencies in microseconds, partitioned by endpoint",
                histogram: "publish_message_duration_seconds",
                histogram_help: "Message publish time in seconds, partitioned by endpoint",
            },
            MetricGroup::Subscribe => FamilySpec {
                ops: "subscribe_message_total",
                ops_help: "Messages processed, partitioned by endpoint and status",
                summary: "subscribe_message_latency_microseconds",
                summary_help:
                    "Message processing latencies in microseconds, partitioned by endpoint",
                histogram: "subscribe_message_duration_seconds",
                histogram_help: "Request time in seconds, partitioned by endpoint",
            },
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            MetricGroup::Client => 0,
            MetricGroup::Server => 1,
            MetricGroup::Publish => 2,
            MetricGroup::Subscribe => 3,
        }
    }
}

/// The three families of one group.
///
/// Cloning is cheap; clones share the underlying vectors.
#[derive(Clone)]
pub struct FamilySet {
    group: MetricGroup,
    ops_name: String,
    summary_name: String,
    histogram_name: String,
    ops: IntCounterVec,
    summary: SummaryVec,
    histogram: HistogramVec,
}

impl FamilySet {
    /// Construct (but do not register) the families of `group`.
    pub fn build(group: MetricGroup, naming: &Naming) -> Result<Self, Error> {
        let spec = group.spec();
        let ops_labels = ops_label_names(naming);
        let latency_labels = latency_label_names(naming);
        let ops_labels: Vec<&str> = ops_labels.iter().map(String::as_str).collect();
        let latency_labels: Vec<&str> = latency_labels.iter().map(String::as_str).collect();

        let ops_name = naming.metric_name(spec.ops);
        let summary_name = naming.metric_name(spec.summary);
        let histogram_name = naming.metric_name(spec.histogram);

        let ops = IntCounterVec::new(Opts::new(ops_name.clone(), spec.ops_help), &ops_labels)?;
        let summary = SummaryVec::new(
            SummaryOpts::new(summary_name.clone(), spec.summary_help),
            &latency_labels,
        )?;
        let histogram = HistogramVec::new(
            HistogramOpts::new(histogram_name.clone(), spec.histogram_help),
            &latency_labels,
        )?;

        Ok(Self {
            group,
            ops_name,
            summary_name,
            histogram_name,
            ops,
            summary,
            histogram,
        })
    }

    /// The group these families belong to.
    pub fn group(&self) -> MetricGroup {
        self.group
    }

    /// Ops counter.
    pub fn ops(&self) -> &IntCounterVec {
        &self.ops
    }

    /// Latency summary (microseconds).
    pub fn summary(&self) -> &SummaryVec {
        &self.summary
    }

    /// Latency histogram (seconds).
    pub fn histogram(&self) -> &HistogramVec {
        &self.histogram
    }

    /// Fully-qualified names: ops, summary, histogram.
    pub fn names(&self) -> [&str; 3] {
        [&self.ops_name, &self.summary_name, &self.histogram_name]
    }

    /// Record one latency observation into both the summary and the histogram.
    pub fn observe_latency(&self, identity: &Identity, endpoint: &str, elapsed: Duration) {
        let values = identity.latency_values(endpoint);
        let seconds = elapsed.as_secs_f64();
        let microseconds = seconds * 1_000_000.0;

        self.summary.with_label_values(&values).observe(microseconds);
        self.histogram.with_label_values(&values).observe(seconds);
    }

    /// Increment the ops counter once for `status`.
    pub fn count(&self, identity: &Identity, endpoint: &str, status: Status) {
        self.ops
            .with_label_values(&identity.ops_values(endpoint, status))
            .inc();
    }

    pub(crate) fn collectors(&self) -> [(&str, Box<dyn Collector>); 3] {
        let ops: Box<dyn Collector> = Box::new(self.ops.clone());
        let summary: Box<dyn Collector> = Box::new(self.summary.clone());
        let histogram: Box<dyn Collector> = Box::new(self.histogram.clone());
        [
            (self.ops_name.as_str(), ops),
            (self.summary_name.as_str(), summary),
            (self.histogram_name.as_str(), histogram),
        ]
    }
}

impl std::fmt::Debug for FamilySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilySet")
            .field("group", &self.group)
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        let naming = Naming::default();
        let expected = [
            (
                MetricGroup::Client,
                [
                    "micro_request_total",
                    "micro_latency_microseconds",
                    "micro_request_duration_seconds",
                ],
            ),
            (
                MetricGroup::Server,
                [
                    "micro_server_request_total",
                    "micro_server_latency_microseconds",
                    "micro_server_request_duration_seconds",
                ],
            ),
            (
                MetricGroup::Publish,
                [
                    "micro_publish_message_total",
                    "micro_publish_message_latency_microseconds",
                    "micro_publish_message_duration_seconds",
                ],
            ),
            (
                MetricGroup::Subscribe,
                [
                    "micro_subscribe_message_total",
                    "micro_subscribe_message_latency_microseconds",
                    "micro_subscribe_message_duration_seconds",
                ],
            ),
        ];

        for (group, names) in expected {
            let set = FamilySet::build(group, &naming).unwrap();
            assert_eq!(set.names(), names);
            assert_eq!(set.group(), group);
        }
    }

    #[test]
    fn test_invalid_prefix() {
        let naming = Naming::new("bad-prefix-", "micro_");
        assert!(matches!(
            FamilySet::build(MetricGroup::Client, &naming),
            Err(Error::Definition(_))
        ));
    }

    #[test]
    fn test_record_observation() {
        let set = FamilySet::build(MetricGroup::Server, &Naming::default()).unwrap();
        let identity = Identity::new("svc", "v1", "i1");

        set.observe_latency(&identity, "Greeter.Hello", Duration::from_millis(2));
        set.count(&identity, "Greeter.Hello", Status::Failure);

        let failures = set
            .ops()
            .with_label_values(&identity.ops_values("Greeter.Hello", Status::Failure))
            .get();
        assert_eq!(failures, 1);

        let values = identity.latency_values("Greeter.Hello");
        let histogram = set.histogram().with_label_values(&values);
        assert_eq!(histogram.get_sample_count(), 1);
        assert!((histogram.get_sample_sum() - 0.002).abs() < 1e-9);

        let summary = set.summary().with_label_values(&values);
        assert_eq!(summary.count(), 1);
        assert!((summary.sum() - 2_000.0).abs() < 1e-6);
    }
}
