//! HTTP backend integration tests
//!
//! A mock analytics proxy is served with axum on an ephemeral port and the
//! reqwest client talks to it for real: request shaping, the `Origin` header,
//! status handling and the readiness probe.

mod common;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use common::{example_analyze_body, example_plausible_body, gate, no_gate};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use traffic_lens::backend::{Backend, HttpBackend};
use traffic_lens::config::ProbeFailurePolicy;
use traffic_lens::pipeline::{
    AnalyzeEndpoint, Analyzer, PlausibleEndpoint, SubmitOutcome, GENERIC_FAILURE_MESSAGE,
};

/// Requests seen by the mock proxy: (origin header, body)
#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn mock_analyze(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.requests.lock().unwrap().push((None, body));
    Json(example_analyze_body())
}

async fn mock_plausible(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let origin = headers
        .get("origin")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    seen.requests.lock().unwrap().push((origin, body));
    Json(example_plausible_body())
}

fn mock_proxy(seen: Seen, key_configured: bool) -> Router {
    Router::new()
        .route(
            "/api/config",
            get(move || async move { Json(json!({"plausible_api_key_configured": key_configured})) }),
        )
        .route("/api/traffic/analyze", post(mock_analyze))
        .route("/api/traffic/proxy/plausible", post(mock_plausible))
        .route(
            "/api/traffic/health",
            get(|| async {
                Json(json!({
                    "status": "healthy",
                    "timestamp": "2024-01-01T00:00:00",
                    "similarweb_api_configured": false,
                    "version": "1.0.0"
                }))
            }),
        )
        .with_state(seen)
}

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn_proxy(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_analyze_over_http() {
    let seen = Seen::default();
    let base_url = spawn_proxy(mock_proxy(seen.clone(), true)).await;
    let backend = Arc::new(HttpBackend::new(&base_url).unwrap());
    let analyzer = Analyzer::new(backend, Box::new(AnalyzeEndpoint), no_gate(), false);

    let SubmitOutcome::Succeeded(view) = analyzer.submit("example.com").await else {
        panic!("expected success");
    };
    assert_eq!(view.visitors, 1000);
    assert_eq!(view.traffic_sources[0].channel, "Direct");

    let requests = seen.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1, json!({"domain": "example.com"}));
}

#[tokio::test]
async fn test_plausible_proxy_receives_origin_and_query() {
    let seen = Seen::default();
    let base_url = spawn_proxy(mock_proxy(seen.clone(), true)).await;
    let backend = Arc::new(HttpBackend::new(&base_url).unwrap());
    let analyzer = Analyzer::new(
        backend,
        Box::new(PlausibleEndpoint::new("http://localhost:8080", "Plausible Analytics")),
        gate(ProbeFailurePolicy::Allow),
        false,
    );

    analyzer.probe_readiness().await;
    assert!(analyzer.trigger_enabled());

    let SubmitOutcome::Succeeded(view) = analyzer.submit("example.com").await else {
        panic!("expected success");
    };
    assert_eq!(view.visitors, 321);
    assert_eq!(view.visit_duration, 125);

    let requests = seen.requests.lock().unwrap();
    assert_eq!(requests[0].0.as_deref(), Some("http://localhost:8080"));
    assert_eq!(
        requests[0].1,
        json!({
            "site_id": "example.com",
            "metrics": ["visitors", "pageviews", "bounce_rate", "visit_duration"],
            "date_range": "30d"
        })
    );
}

#[tokio::test]
async fn test_probe_reports_missing_key() {
    let base_url = spawn_proxy(mock_proxy(Seen::default(), false)).await;
    let backend = Arc::new(HttpBackend::new(&base_url).unwrap());
    let analyzer = Analyzer::new(
        backend,
        Box::new(AnalyzeEndpoint),
        gate(ProbeFailurePolicy::Allow),
        false,
    );

    analyzer.probe_readiness().await;

    assert_eq!(
        analyzer.readiness().map(|f| f.plausible_api_key_configured),
        Some(false)
    );
    assert!(!analyzer.trigger_enabled());
}

#[tokio::test]
async fn test_server_error_is_a_generic_failure() {
    let router = Router::new().route(
        "/api/traffic/analyze",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream key missing") }),
    );
    let base_url = spawn_proxy(router).await;
    let backend = Arc::new(HttpBackend::new(&base_url).unwrap());
    let analyzer = Analyzer::new(backend, Box::new(AnalyzeEndpoint), no_gate(), false);

    assert_eq!(
        analyzer.submit("example.com").await,
        SubmitOutcome::Failed(GENERIC_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn test_non_json_body_is_a_generic_failure() {
    let router = Router::new().route(
        "/api/traffic/analyze",
        post(|| async { "<html>not json</html>" }),
    );
    let base_url = spawn_proxy(router).await;
    let backend = Arc::new(HttpBackend::new(&base_url).unwrap());
    let analyzer = Analyzer::new(backend, Box::new(AnalyzeEndpoint), no_gate(), false);

    assert_eq!(
        analyzer.submit("example.com").await,
        SubmitOutcome::Failed(GENERIC_FAILURE_MESSAGE)
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_generic_failure() {
    // Bind and drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = Arc::new(HttpBackend::new(&format!("http://{}", addr)).unwrap());
    let analyzer = Analyzer::new(
        backend,
        Box::new(AnalyzeEndpoint),
        gate(ProbeFailurePolicy::Allow),
        false,
    );

    analyzer.probe_readiness().await;
    assert!(analyzer.readiness().is_none());
    assert!(analyzer.trigger_enabled());

    assert_eq!(
        analyzer.submit("example.com").await,
        SubmitOutcome::Failed(GENERIC_FAILURE_MESSAGE)
    );
    assert!(analyzer.snapshot().view.result().is_none());
}

#[tokio::test]
async fn test_backend_health_report() {
    let base_url = spawn_proxy(mock_proxy(Seen::default(), true)).await;
    let backend = HttpBackend::new(&base_url).unwrap();

    let health = backend.health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version.as_deref(), Some("1.0.0"));
    assert_eq!(health.similarweb_api_configured, Some(false));
}
