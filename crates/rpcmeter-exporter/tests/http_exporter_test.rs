//! HTTP exporter tests driven through the router without a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use rpcmeter::{MetricsRegistry, Naming, WrapperOptions};
use rpcmeter_exporter::{create_router, AppState, Demo, ExporterConfig};
use tower::ServiceExt;

fn isolated_state() -> AppState {
    let registry = Arc::new(MetricsRegistry::default().with_naming(Naming::default()));
    AppState::new(registry, ExporterConfig::default())
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = create_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_empty_before_any_wrapper() {
    let (status, content_type, body) = get(isolated_state(), "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(prometheus::TEXT_FORMAT));
    assert!(body.is_empty());
}

#[tokio::test]
async fn metrics_after_demo_tick() {
    let state = isolated_state();
    let demo = Demo::new(WrapperOptions::new().with_registry(state.metrics.clone()))
        .await
        .unwrap();
    demo.tick().await;

    let (status, _, body) = get(state, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    for family in [
        "micro_request_total",
        "micro_latency_microseconds",
        "micro_request_duration_seconds",
        "micro_server_request_total",
        "micro_server_request_duration_seconds",
        "micro_publish_message_total",
        "micro_subscribe_message_total",
        "micro_subscribe_message_duration_seconds",
    ] {
        assert!(
            body.contains(&format!("# TYPE {} ", family)),
            "{} missing from exposition",
            family
        );
    }
    assert!(body.contains("micro_endpoint=\"greeter.Greeter.Hello\""));
    assert!(body.contains("micro_endpoint=\"Greeter.Fail\""));
    assert!(body.contains("micro_status=\"failure\""));
    assert!(body.contains("micro_endpoint=\"greetings\""));
}

#[tokio::test]
async fn health_lists_registered_groups() {
    let state = isolated_state();
    let (_, _, body) = get(state.clone(), "/health").await;
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["registered_groups"].as_array().unwrap().len(), 0);

    Demo::new(WrapperOptions::new().with_registry(state.metrics.clone()))
        .await
        .unwrap();

    let (status, _, body) = get(state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        health["registered_groups"],
        serde_json::json!(["client", "server", "publish", "subscribe"])
    );
    // Families without children are not gathered.
    assert_eq!(health["families"], 0);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _, _) = get(isolated_state(), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
