//! End-to-end tests of a refresh tick against mocked backends

use dns_dashboard::{
    Panel, ProbeOutcome,
    actors::refresh::RefreshHandle,
};
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_unreachable_tick_builds_payload_and_alerts_once() {
    let metrics = start_metrics_backend().await;
    let gotify = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .and(header("X-Gotify-Key", "test-token"))
        .and(body_partial_json(serde_json::json!({
            "title": "Server Inaccessible",
            "message": format!("Server {TEST_DOMAIN} is not accessible from Iran"),
            "priority": 5
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gotify)
        .await;

    let log = create_access_log(15);
    let config = create_test_config(&metrics.uri(), &gotify.uri(), log.path(), "false");
    let (mut actor, mut payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    let dns = payload.dns.ready().expect("dns chart should be ready");
    assert_eq!(dns.sample_count(), 1);
    assert_eq!(dns.samples[0].value, 5.0);
    assert_eq!(dns.title, "DNS Queries per Second");

    let traefik = payload.traefik.ready().expect("traefik chart should be ready");
    assert_eq!(traefik.sample_count(), 2);
    assert_eq!(
        traefik.groups().keys().cloned().collect::<Vec<_>>(),
        vec!["web".to_string(), "websecure".to_string()]
    );

    let logs = payload.logs.ready().expect("logs should be ready");
    assert_eq!(logs.len(), 10);
    assert!(logs[0].contains("/page/5 "));
    assert!(logs[9].contains("/page/14 "));

    assert_eq!(payload.probe.outcome, ProbeOutcome::Unreachable { exit_code: 1 });
    assert_eq!(payload.status, "Server is not accessible from Iran");
    assert!(payload.alert.is_some());

    // Payload is broadcast as well
    let published = payload_rx.recv().await.unwrap();
    assert_eq!(published.tick, payload.tick);
}

#[tokio::test]
async fn test_reachable_tick_sends_no_alert() {
    let metrics = start_metrics_backend().await;
    let gotify = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gotify)
        .await;

    let log = create_access_log(3);
    let config = create_test_config(&metrics.uri(), &gotify.uri(), log.path(), "true");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    let payload = actor.refresh().await;

    assert!(payload.probe.is_reachable());
    assert!(payload.alert.is_none());
    assert_eq!(payload.status, "Server is accessible from Iran");
    assert_eq!(payload.logs.ready().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_every_failing_tick_alerts_again() {
    let metrics = start_metrics_backend().await;
    let gotify = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/message"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&gotify)
        .await;

    let log = create_access_log(1);
    let config = create_test_config(&metrics.uri(), &gotify.uri(), log.path(), "false");
    let (mut actor, _payload_rx) = create_test_actor(&config);

    for expected_tick in 0..3 {
        let payload = actor.refresh().await;
        assert_eq!(payload.tick, expected_tick);
        assert!(payload.alert.is_some());
    }
}

#[tokio::test]
async fn test_spawned_actor_ticks_immediately() {
    let metrics = start_metrics_backend().await;
    let log = create_access_log(2);
    let config = create_test_config(&metrics.uri(), "http://127.0.0.1:9", log.path(), "true");

    let (payload_tx, mut payload_rx) = broadcast::channel(16);
    let handle = RefreshHandle::spawn(&config, payload_tx).unwrap();

    let first = tokio::time::timeout(tokio::time::Duration::from_secs(5), payload_rx.recv())
        .await
        .expect("first tick should not wait for the interval")
        .unwrap();
    assert!(matches!(first.dns, Panel::Ready { .. }));

    let manual = handle.refresh_now().await.unwrap();
    assert!(manual.tick > first.tick);

    handle.shutdown().await.unwrap();
}
