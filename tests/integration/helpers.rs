//! Shared test helpers

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use dns_dashboard::{
    actors::{
        messages::RenderPayload,
        refresh::{PayloadStore, RefreshActor},
    },
    config::{Config, DOMAIN, GOTIFY_TOKEN, GOTIFY_URL, ResolvedConfig},
};
use tokio::sync::{broadcast, mpsc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DNS_QUERY: &str = "rate(dnsmasq_queries_total[5m])";
pub const TRAEFIK_QUERY: &str = "sum(rate(traefik_entrypoint_requests_total[5m])) by (entrypoint)";
pub const TEST_DOMAIN: &str = "dashboard.example.org";

/// Resolve a configuration through the same path the binary uses
pub fn create_test_config(
    metrics_url: &str,
    gotify_url: &str,
    log_path: &Path,
    program: &str,
) -> ResolvedConfig {
    let env: HashMap<&str, String> = HashMap::from([
        (GOTIFY_URL, gotify_url.to_string()),
        (GOTIFY_TOKEN, "test-token".to_string()),
        (DOMAIN, TEST_DOMAIN.to_string()),
    ]);

    let mut config = Config::default();
    config.apply_env(|key| env.get(key).cloned()).unwrap();
    config.metrics.url = metrics_url.to_string();
    config.metrics.timeout = 5;
    config.log.path = log_path.to_path_buf();
    config.probe.program = program.to_string();
    config.probe.ranges = vec!["127.0.0.0/8".to_string()];
    config.probe.wait = 1;
    config.interval = 3600;
    config.bind = "127.0.0.1:0".parse().unwrap();
    config.resolve().unwrap()
}

/// Build an actor without spawning it, so ticks run only when the test asks
pub fn create_test_actor(
    config: &ResolvedConfig,
) -> (RefreshActor, broadcast::Receiver<RenderPayload>) {
    let (_cmd_tx, cmd_rx) = mpsc::channel(1);
    let (payload_tx, payload_rx) = broadcast::channel(16);
    let actor = RefreshActor::new(config, cmd_rx, payload_tx, PayloadStore::new()).unwrap();
    (actor, payload_rx)
}

pub fn create_access_log(lines: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..lines {
        writeln!(
            file,
            "10.0.0.{i} - - [16/Oct/2026:12:00:{:02} +0000] \"GET /page/{i} HTTP/1.1\" 200 512",
            i % 60
        )
        .unwrap();
    }
    file
}

/// Mount an instant-query response for one expression
pub async fn mount_query(server: &MockServer, expression: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", expression))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Metrics backend answering both dashboard queries
pub async fn start_metrics_backend() -> MockServer {
    let server = MockServer::start().await;

    mount_query(
        &server,
        DNS_QUERY,
        serde_json::json!({"data": {"result": [{"metric": {}, "value": [1700000000, "5"]}]}}),
    )
    .await;

    mount_query(
        &server,
        TRAEFIK_QUERY,
        serde_json::json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"entrypoint": "web"}, "value": [1700000000, "1.25"]},
                    {"metric": {"entrypoint": "websecure"}, "value": [1700000000, "4"]}
                ]
            }
        }),
    )
    .await;

    server
}
