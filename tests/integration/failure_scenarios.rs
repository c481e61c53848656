//! Failure tests for the refresh pipeline
//!
//! A failing section must degrade only itself:
//! - Metrics backend errors and malformed responses
//! - Missing access log
//! - Echo utility that cannot be executed

use assert_matches::assert_matches;
use dns_dashboard::{Panel, ProbeOutcome, render::render_page};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_metrics_500_fails_only_charts() {
    let metrics = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&metrics)
        .await;

    let log = create_access_log(4);
    let config = create_test_config(&metrics.uri(), "http://127.0.0.1:9", log.path(), "true");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert_matches!(&payload.dns, Panel::Failed { message } if message.contains("500"));
    assert_matches!(&payload.traefik, Panel::Failed { .. });
    assert_eq!(payload.logs.ready().map(Vec::len), Some(4));
    assert!(payload.probe.is_reachable());

    let page = render_page(Some(&payload), 60);
    assert!(page.contains("Server is accessible from Iran"));
}

#[tokio::test]
async fn test_malformed_metrics_response() {
    let metrics = MockServer::start().await;
    mount_query(&metrics, DNS_QUERY, serde_json::json!({"data": {}})).await;
    mount_query(
        &metrics,
        TRAEFIK_QUERY,
        serde_json::json!({"data": {"result": []}}),
    )
    .await;

    let log = create_access_log(1);
    let config = create_test_config(&metrics.uri(), "http://127.0.0.1:9", log.path(), "true");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert_matches!(&payload.dns, Panel::Failed { message } if message.contains("malformed"));
    assert_eq!(payload.traefik.ready().map(|chart| chart.sample_count()), Some(0));
}

#[tokio::test]
async fn test_missing_log_fails_only_log_panel() {
    let metrics = start_metrics_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("access.log");

    let config = create_test_config(&metrics.uri(), "http://127.0.0.1:9", &missing, "true");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert_matches!(&payload.logs, Panel::Failed { message } if message.contains("access.log"));
    assert!(payload.dns.ready().is_some());
    assert!(payload.traefik.ready().is_some());
}

#[tokio::test]
async fn test_probe_execution_failure_still_alerts() {
    let metrics = start_metrics_backend().await;
    let gotify = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gotify)
        .await;

    let log = create_access_log(1);
    let config = create_test_config(
        &metrics.uri(),
        &gotify.uri(),
        log.path(),
        "/nonexistent/echo-utility",
    );
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert_matches!(payload.probe.outcome, ProbeOutcome::ExecutionFailed { .. });
    assert!(payload.alert.is_some());
    assert_eq!(payload.status, "Server is not accessible from Iran");
}

#[tokio::test]
async fn test_gotify_failure_does_not_affect_payload() {
    let metrics = start_metrics_backend().await;
    let gotify = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&gotify)
        .await;

    let log = create_access_log(1);
    let config = create_test_config(&metrics.uri(), &gotify.uri(), log.path(), "false");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert!(payload.alert.is_some());
    assert!(payload.dns.ready().is_some());
}
