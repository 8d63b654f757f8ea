//! Exporter configuration.

use std::time::Duration;

use clap::Parser;
use rpcmeter::{Naming, WrapperOptions};

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9090";

/// Default interval between demo requests in milliseconds.
pub const DEFAULT_DEMO_INTERVAL_MS: u64 = 500;

/// rpcmeter Prometheus exporter command line arguments.
#[derive(Debug, Parser)]
#[command(name = "rpcmeter-exporter")]
#[command(about = "Prometheus scrape endpoint for rpcmeter-instrumented services")]
pub struct Args {
    /// Address to listen on for scrapes.
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Prefix for metric names.
    #[arg(long, default_value = rpcmeter::DEFAULT_METRIC_PREFIX)]
    pub metric_prefix: String,

    /// Prefix for label names.
    #[arg(long, default_value = rpcmeter::DEFAULT_LABEL_PREFIX)]
    pub label_prefix: String,

    /// Service name label value.
    #[arg(long, default_value = "greeter")]
    pub service_name: String,

    /// Service version label value.
    #[arg(long)]
    pub service_version: Option<String>,

    /// Service instance id label value.
    #[arg(long)]
    pub service_id: Option<String>,

    /// Generate synthetic traffic through an instrumented in-process service.
    #[arg(long)]
    pub demo: bool,

    /// Interval (ms) between demo requests.
    #[arg(long, default_value_t = DEFAULT_DEMO_INTERVAL_MS)]
    pub demo_interval_ms: u64,
}

/// Exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Address to listen on for scrapes.
    pub listen_addr: String,
    /// Metric and label prefixes.
    pub naming: Naming,
    /// Service name label value.
    pub service_name: String,
    /// Service version label value.
    pub service_version: String,
    /// Service instance id label value.
    pub service_id: String,
    /// Demo traffic interval. `None` disables the demo.
    pub demo_interval: Option<Duration>,
}

impl ExporterConfig {
    /// Wrapper options carrying the configured service identity.
    pub fn wrapper_options(&self) -> WrapperOptions {
        WrapperOptions::new()
            .with_name(&self.service_name)
            .with_version(&self.service_version)
            .with_id(&self.service_id)
    }
}

impl From<&Args> for ExporterConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            naming: Naming::new(&args.metric_prefix, &args.label_prefix),
            service_name: args.service_name.clone(),
            service_version: args.service_version.clone().unwrap_or_default(),
            service_id: args.service_id.clone().unwrap_or_default(),
            demo_interval: args
                .demo
                .then(|| Duration::from_millis(args.demo_interval_ms.max(1))),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            naming: Naming::default(),
            service_name: "greeter".to_string(),
            service_version: String::new(),
            service_id: String::new(),
            demo_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["rpcmeter-exporter"]);
        let config = ExporterConfig::from(&args);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.naming, Naming::default());
        assert!(config.demo_interval.is_none());
    }

    #[test]
    fn test_args_demo() {
        let args = Args::parse_from([
            "rpcmeter-exporter",
            "--demo",
            "--demo-interval-ms",
            "250",
            "--metric-prefix",
            "shop_",
            "--service-id",
            "greeter-1",
        ]);
        let config = ExporterConfig::from(&args);
        assert_eq!(config.demo_interval, Some(Duration::from_millis(250)));
        assert_eq!(config.naming.metric_prefix, "shop_");
        assert_eq!(config.wrapper_options().id, "greeter-1");
    }
}
