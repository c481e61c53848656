//! Instant queries against a Prometheus-compatible metrics backend
//!
//! ## Message Flow
//!
//! ```text
//! expression → GET /api/v1/query?query=… → data.result[*] → MetricSample → ChartSpec
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::config::MetricsConfig;
use crate::error::{DashboardError, DashboardResult};

/// Group name for samples that carry neither the grouping label nor a metric name
const DEFAULT_GROUP: &str = "value";

/// A chart to build from one instant query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartQuery {
    pub title: String,

    /// Query expression understood by the backend
    pub query: String,

    /// Label whose value splits the samples into lines
    #[serde(default)]
    pub group_by: Option<String>,
}

/// One series entry of an instant-query response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// Evaluation time in seconds since the epoch
    pub timestamp: f64,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
}

impl MetricSample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Samples for one line chart, in response order
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub group_by: Option<String>,
    pub samples: Vec<MetricSample>,
}

impl ChartSpec {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Samples partitioned into lines by the grouping label
    pub fn groups(&self) -> BTreeMap<String, Vec<&MetricSample>> {
        let mut groups: BTreeMap<String, Vec<&MetricSample>> = BTreeMap::new();
        for sample in &self.samples {
            let key = self
                .group_by
                .as_deref()
                .and_then(|label| sample.label(label))
                .or_else(|| sample.label("__name__"))
                .unwrap_or(DEFAULT_GROUP);
            groups.entry(key.to_string()).or_default().push(sample);
        }
        groups
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    result: Vec<ResultEntry>,
}

#[derive(Debug, Deserialize)]
struct ResultEntry {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

/// Parse the body of an instant-query response into samples
pub fn parse_query_response(body: &str) -> DashboardResult<Vec<MetricSample>> {
    let response: QueryResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::MalformedResponse(format!("invalid query response: {e}")))?;

    if response.status.as_deref() == Some("error") {
        return Err(DashboardError::BackendUnavailable(format!(
            "{}: {}",
            response.error_type.as_deref().unwrap_or("error"),
            response.error.as_deref().unwrap_or("query failed")
        )));
    }

    let data = response
        .data
        .ok_or_else(|| DashboardError::MalformedResponse("missing data field".to_string()))?;

    data.result
        .into_iter()
        .map(|entry| -> DashboardResult<MetricSample> {
            let (timestamp, raw) = entry.value;
            Ok(MetricSample {
                timestamp,
                value: parse_sample_value(&raw)?,
                labels: entry.metric,
            })
        })
        .collect()
}

fn parse_sample_value(raw: &str) -> DashboardResult<f64> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => raw
            .parse()
            .map_err(|_| DashboardError::MalformedResponse(format!("non-numeric value '{raw}'"))),
    }
}

#[derive(Debug, Clone)]
pub struct MetricsClient {
    /// HTTP client (reused across requests)
    client: reqwest::Client,
    base_url: String,
}

impl MetricsClient {
    pub fn new(config: &MetricsConfig) -> DashboardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| {
                DashboardError::BackendUnavailable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Run an instant query and return its samples as an untitled chart
    pub async fn query(&self, expression: &str) -> DashboardResult<ChartSpec> {
        let samples = self.fetch(expression).await?;
        Ok(ChartSpec {
            title: expression.to_string(),
            group_by: None,
            samples,
        })
    }

    pub async fn query_chart(&self, chart: &ChartQuery) -> DashboardResult<ChartSpec> {
        let samples = self.fetch(&chart.query).await?;
        Ok(ChartSpec {
            title: chart.title.clone(),
            group_by: chart.group_by.clone(),
            samples,
        })
    }

    #[instrument(skip(self))]
    async fn fetch(&self, expression: &str) -> DashboardResult<Vec<MetricSample>> {
        let url = format!("{}/api/v1/query", self.base_url);

        trace!("querying {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("query", expression)])
            .send()
            .await
            .map_err(|e| DashboardError::BackendUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DashboardError::BackendUnavailable(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            DashboardError::BackendUnavailable(format!("failed to read response body: {e}"))
        })?;

        let samples = parse_query_response(&body)?;
        trace!("received {} samples", samples.len());
        Ok(samples)
    }
}
