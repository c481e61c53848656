//! Reachability probing from a set of external address ranges
//!
//! Each probe picks one configured range at random and sends a single echo
//! request to its network address. One sample per tick keeps the probe cheap;
//! a single result is indicative, not conclusive.

use std::fmt;
use std::net::IpAddr;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use crate::config::ProbeSettings;
use crate::error::{ConfigError, DashboardError};

/// Extra time granted to the echo utility on top of its own wait flag
const GUARD_GRACE: Duration = Duration::from_secs(5);

/// Ceiling for the overall echo guard
const MAX_GUARD: Duration = Duration::from_secs(15 * 60);

/// A CIDR network prefix such as `5.22.0.0/17`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    network: IpAddr,
    prefix_len: u8,
}

impl AddressRange {
    /// Address written before the prefix-length suffix
    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether `ip` falls inside this prefix
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX
                    .checked_shl(32 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for AddressRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ConfigError::invalid("probe.ranges", message);

        let (addr, len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| invalid(format!("{s}: missing prefix length")))?;

        let network: IpAddr = addr.parse().map_err(|e| invalid(format!("{s}: {e}")))?;
        let prefix_len: u8 = len.parse().map_err(|e| invalid(format!("{s}: {e}")))?;

        let max = if network.is_ipv4() { 32 } else { 128 };
        if prefix_len > max {
            return Err(invalid(format!("{s}: prefix length {prefix_len} exceeds {max}")));
        }

        Ok(Self { network, prefix_len })
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Outcome of a single echo request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The echo utility exited successfully
    Reachable,

    /// The echo utility ran and reported failure
    Unreachable { exit_code: i32 },

    /// The echo utility could not be run to completion
    ExecutionFailed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub address: IpAddr,
    pub outcome: ProbeOutcome,
    pub checked_at: DateTime<Utc>,
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        self.outcome == ProbeOutcome::Reachable
    }
}

#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    ranges: Arc<[AddressRange]>,
    program: String,
    count: u32,
    wait: Duration,
}

impl ReachabilityProbe {
    pub fn new(settings: &ProbeSettings) -> Result<Self, ConfigError> {
        if settings.ranges.is_empty() {
            return Err(ConfigError::invalid("probe.ranges", "no address ranges configured"));
        }

        Ok(Self {
            ranges: settings.ranges.clone(),
            program: settings.program.clone(),
            count: settings.count,
            wait: settings.wait,
        })
    }

    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }

    /// Pick one range uniformly and return its network address
    pub fn select_address<R: Rng + ?Sized>(&self, rng: &mut R) -> IpAddr {
        let index = rng.random_range(0..self.ranges.len());
        self.ranges[index].network()
    }

    /// Probe one randomly selected address
    pub async fn probe(&self) -> ProbeResult {
        let address = self.select_address(&mut rand::rng());
        self.probe_address(address).await
    }

    #[instrument(skip(self))]
    pub async fn probe_address(&self, address: IpAddr) -> ProbeResult {
        let outcome = match self.run_echo(address).await {
            Ok(0) => ProbeOutcome::Reachable,
            Ok(exit_code) => {
                debug!("echo to {address} failed with exit code {exit_code}");
                ProbeOutcome::Unreachable { exit_code }
            }
            Err(e) => {
                error!("error checking accessibility: {e}");
                ProbeOutcome::ExecutionFailed {
                    error: e.to_string(),
                }
            }
        };

        ProbeResult {
            address,
            outcome,
            checked_at: Utc::now(),
        }
    }

    /// Time allowed for the echo utility before it is killed
    fn guard(&self) -> Duration {
        self.wait
            .checked_mul(self.count)
            .and_then(|d| d.checked_add(GUARD_GRACE))
            .map_or(MAX_GUARD, |d| d.min(MAX_GUARD))
    }

    async fn run_echo(&self, address: IpAddr) -> Result<i32, DashboardError> {
        let mut command = Command::new(&self.program);
        command
            .arg("-c")
            .arg(self.count.to_string())
            .arg("-W")
            .arg(self.wait.as_secs().to_string())
            .arg(address.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let guard = self.guard();
        match timeout(guard, command.status()).await {
            Ok(Ok(status)) => status.code().ok_or_else(|| {
                DashboardError::ProbeExecution(format!("{} terminated by signal", self.program))
            }),
            Ok(Err(e)) => Err(DashboardError::ProbeExecution(format!("{}: {e}", self.program))),
            Err(_) => {
                warn!("echo to {address} exceeded {guard:?}");
                Err(DashboardError::ProbeExecution(format!(
                    "{} did not finish within {guard:?}",
                    self.program
                )))
            }
        }
    }
}
