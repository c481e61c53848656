use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::error::ConfigError;
use crate::metrics::ChartQuery;
use crate::probe::AddressRange;

pub const GOTIFY_URL: &str = "GOTIFY_URL";
pub const GOTIFY_TOKEN: &str = "GOTIFY_TOKEN";
pub const DOMAIN: &str = "DOMAIN";
pub const PROMETHEUS_URL: &str = "PROMETHEUS_URL";
pub const ACCESS_LOG_PATH: &str = "ACCESS_LOG_PATH";
pub const DASHBOARD_BIND: &str = "DASHBOARD_BIND";

/// Upper bounds on the probe so one echo never spans several ticks
const MAX_PROBE_WAIT_SECS: u64 = 60;
const MAX_PROBE_COUNT: u32 = 10;
const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Sample of Iranian address ranges probed when none are configured
const DEFAULT_RANGES: [&str; 25] = [
    "2.144.0.0/14",
    "2.176.0.0/12",
    "5.22.0.0/17",
    "5.22.192.0/19",
    "5.23.112.0/21",
    "5.52.0.0/16",
    "5.53.32.0/19",
    "5.56.128.0/22",
    "5.57.32.0/21",
    "5.61.24.0/22",
    "5.62.160.0/19",
    "5.72.0.0/14",
    "5.102.16.0/20",
    "5.106.0.0/16",
    "5.134.128.0/18",
    "5.144.128.0/18",
    "5.160.0.0/15",
    "5.190.0.0/16",
    "5.198.160.0/19",
    "5.200.0.0/19",
    "5.201.128.0/17",
    "5.202.0.0/16",
    "5.208.0.0/12",
    "5.226.0.0/16",
    "5.232.0.0/13",
];

/// Raw configuration as read from the config file and the environment
///
/// Every field is optional or defaulted; [`Config::resolve`] turns it into a
/// [`ResolvedConfig`] and rejects anything missing or unusable.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub metrics: MetricsConfig,
    pub gotify: GotifyConfig,

    /// Domain name used in alert messages
    pub domain: Option<String>,

    pub log: LogConfig,
    pub probe: ProbeConfig,
    pub charts: ChartsConfig,

    /// Refresh interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig::default(),
            gotify: GotifyConfig::default(),
            domain: None,
            log: LogConfig::default(),
            probe: ProbeConfig::default(),
            charts: ChartsConfig::default(),
            interval: default_interval(),
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Base URL of the Prometheus-compatible backend
    pub url: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            url: "http://prometheus:9090".to_string(),
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct GotifyConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub priority: u8,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for GotifyConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            priority: 5,
            timeout: 10,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
    pub lines: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/app/traefik_logs/access.log"),
            lines: 10,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Label for the probed region, used in status and alert text
    pub region: String,

    /// CIDR ranges to pick probe targets from
    pub ranges: Vec<String>,

    /// Echo utility to execute
    pub program: String,

    pub count: u32,

    /// Per-echo wait in seconds
    pub wait: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            region: "Iran".to_string(),
            ranges: DEFAULT_RANGES.iter().map(|r| r.to_string()).collect(),
            program: "ping".to_string(),
            count: 1,
            wait: 5,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    pub dns: ChartQuery,
    pub traefik: ChartQuery,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            dns: ChartQuery {
                title: "DNS Queries per Second".to_string(),
                query: "rate(dnsmasq_queries_total[5m])".to_string(),
                group_by: None,
            },
            traefik: ChartQuery {
                title: "Traefik Requests per Second".to_string(),
                query: "sum(rate(traefik_entrypoint_requests_total[5m])) by (entrypoint)"
                    .to_string(),
                group_by: Some("entrypoint".to_string()),
            },
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8050))
}

/// Validated configuration handed to every component
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub metrics: MetricsConfig,
    pub notifier: NotifierSettings,
    pub domain: String,
    pub log: LogConfig,
    pub probe: ProbeSettings,
    pub charts: ChartsConfig,
    pub interval: Duration,
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub url: String,
    pub token: String,
    pub priority: u8,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub region: String,
    pub ranges: Arc<[AddressRange]>,
    pub program: String,
    pub count: u32,
    pub wait: Duration,
}

impl Config {
    /// Load the config file (if any) and overlay the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_config_file(path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(GOTIFY_URL) {
            self.gotify.url = Some(url);
        }
        if let Some(token) = lookup(GOTIFY_TOKEN) {
            self.gotify.token = Some(token);
        }
        if let Some(domain) = lookup(DOMAIN) {
            self.domain = Some(domain);
        }
        if let Some(url) = lookup(PROMETHEUS_URL) {
            self.metrics.url = url;
        }
        if let Some(path) = lookup(ACCESS_LOG_PATH) {
            self.log.path = PathBuf::from(path);
        }
        if let Some(bind) = lookup(DASHBOARD_BIND) {
            self.bind = bind
                .parse()
                .map_err(|e| ConfigError::invalid(DASHBOARD_BIND, format!("{bind}: {e}")))?;
        }
        Ok(())
    }

    /// Validate everything and produce the configuration components run with
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let gotify_url = required(self.gotify.url, GOTIFY_URL)?;
        validate_url(GOTIFY_URL, &gotify_url)?;
        let token = required(self.gotify.token, GOTIFY_TOKEN)?;
        let domain = required(self.domain, DOMAIN)?;

        validate_url("metrics.url", &self.metrics.url)?;
        if self.metrics.timeout == 0 {
            return Err(ConfigError::invalid("metrics.timeout", "must be positive"));
        }
        if self.gotify.timeout == 0 {
            return Err(ConfigError::invalid("gotify.timeout", "must be positive"));
        }

        if !(1..=MAX_INTERVAL_SECS).contains(&self.interval) {
            return Err(ConfigError::invalid(
                "interval",
                format!("must be between 1 and {MAX_INTERVAL_SECS} seconds"),
            ));
        }

        if !(1..=MAX_PROBE_WAIT_SECS).contains(&self.probe.wait) {
            return Err(ConfigError::invalid(
                "probe.wait",
                format!("must be between 1 and {MAX_PROBE_WAIT_SECS} seconds"),
            ));
        }
        if !(1..=MAX_PROBE_COUNT).contains(&self.probe.count) {
            return Err(ConfigError::invalid(
                "probe.count",
                format!("must be between 1 and {MAX_PROBE_COUNT}"),
            ));
        }
        if self.probe.program.trim().is_empty() {
            return Err(ConfigError::Missing("probe.program"));
        }
        if self.probe.ranges.is_empty() {
            return Err(ConfigError::invalid("probe.ranges", "no address ranges configured"));
        }
        let ranges = self
            .probe
            .ranges
            .iter()
            .map(|range| range.parse::<AddressRange>())
            .collect::<Result<Vec<_>, _>>()?;

        for chart in [&self.charts.dns, &self.charts.traefik] {
            if chart.query.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "charts",
                    format!("chart '{}' has an empty query", chart.title),
                ));
            }
        }

        Ok(ResolvedConfig {
            metrics: MetricsConfig {
                url: self.metrics.url.trim_end_matches('/').to_string(),
                timeout: self.metrics.timeout,
            },
            notifier: NotifierSettings {
                url: gotify_url.trim_end_matches('/').to_string(),
                token,
                priority: self.gotify.priority,
                timeout: Duration::from_secs(self.gotify.timeout),
            },
            domain,
            log: self.log,
            probe: ProbeSettings {
                region: self.probe.region,
                ranges: ranges.into(),
                program: self.probe.program,
                count: self.probe.count,
                wait: Duration::from_secs(self.probe.wait),
            },
            charts: self.charts,
            interval: Duration::from_secs(self.interval),
            bind: self.bind,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(field)),
    }
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(field, format!("{url}: {e}")))
}

pub fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(ConfigError::from)
        .inspect(|config| trace!("loaded config: {config:?}"))
}
