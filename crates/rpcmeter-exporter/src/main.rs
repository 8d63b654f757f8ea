//! rpcmeter exporter binary.

use clap::Parser;
use rpcmeter::{set_default_label_prefix, set_default_metric_prefix, MetricsRegistry};
use rpcmeter_exporter::{create_router, AppState, Args, Demo, ExporterConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ExporterConfig::from(&args);

    // Prefixes must be set before any wrapper registers its families.
    set_default_metric_prefix(config.naming.metric_prefix.clone());
    set_default_label_prefix(config.naming.label_prefix.clone());

    info!(
        listen = %config.listen_addr,
        metric_prefix = %config.naming.metric_prefix,
        label_prefix = %config.naming.label_prefix,
        "Starting rpcmeter exporter"
    );

    let metrics = MetricsRegistry::global();

    if let Some(interval) = config.demo_interval {
        let demo = Demo::new(config.wrapper_options()).await?;
        tokio::spawn(demo.run(interval));
    }

    let state = AppState::new(metrics, config.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Exporter listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
