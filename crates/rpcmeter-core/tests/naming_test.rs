//! Process-wide prefix behaviour.
//!
//! Runs in its own test binary because it mutates the global prefixes.

use prometheus::Registry;
use rpcmeter_core::{
    set_default_label_prefix, set_default_metric_prefix, MetricGroup, MetricsRegistry, Naming,
};

#[test]
fn prefix_is_read_at_registration() {
    set_default_metric_prefix("shop_");
    set_default_label_prefix("rpc_");
    assert_eq!(Naming::current(), Naming::new("shop_", "rpc_"));

    let metrics = MetricsRegistry::new(Registry::new());
    let client = metrics.try_ensure(MetricGroup::Client).unwrap();
    assert_eq!(client.names()[0], "shop_request_total");

    // Later changes only affect groups registered afterwards.
    set_default_metric_prefix("late_");
    set_default_label_prefix("late_");

    let again = metrics.try_ensure(MetricGroup::Client).unwrap();
    assert_eq!(again.names()[0], "shop_request_total");

    let server = metrics.try_ensure(MetricGroup::Server).unwrap();
    assert_eq!(server.names()[0], "late_server_request_total");

    let identity = rpcmeter_core::Identity::new("svc", "v1", "i1");
    client.count(&identity, "Greeter.Hello", rpcmeter_core::Status::Success);
    let text = metrics.encode_text().unwrap();
    assert!(text.contains("shop_request_total{rpc_endpoint=\"Greeter.Hello\""));
}

#[test]
fn pinned_naming_ignores_defaults() {
    let metrics =
        MetricsRegistry::new(Registry::new()).with_naming(Naming::new("pinned_", "pinned_"));
    let publish = metrics.try_ensure(MetricGroup::Publish).unwrap();
    assert_eq!(publish.names()[0], "pinned_publish_message_total");
}
