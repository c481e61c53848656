//! Message types for the refresh actor
//!
//! 1. **Commands**: sent to the actor via mpsc
//! 2. **Events**: every finished tick is broadcast as a [`RenderPayload`]

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::DashboardResult;
use crate::metrics::ChartSpec;
use crate::notifier::AlertEvent;
use crate::probe::ProbeResult;

/// One section of the page; a failing section does not take the others down
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready { data: T },
    Failed { message: String },
}

impl<T> Panel<T> {
    pub fn from_result(section: &str, result: DashboardResult<T>) -> Self {
        match result {
            Ok(data) => Panel::Ready { data },
            Err(e) => {
                warn!("{section} unavailable: {e}");
                Panel::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready { data } => Some(data),
            Panel::Failed { .. } => None,
        }
    }
}

/// Everything the dashboard shows for one tick
#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload {
    /// Tick number, starting at 0
    pub tick: u64,
    pub generated_at: DateTime<Utc>,
    pub dns: Panel<ChartSpec>,
    pub traefik: Panel<ChartSpec>,
    pub logs: Panel<Vec<String>>,
    pub probe: ProbeResult,

    /// One-line accessibility status
    pub status: String,

    /// Alert pushed during this tick, if any
    pub alert: Option<AlertEvent>,
}

/// Commands that can be sent to the RefreshActor
#[derive(Debug)]
pub enum RefreshCommand {
    /// Run a tick immediately (bypassing the interval timer)
    RefreshNow {
        respond_to: oneshot::Sender<RenderPayload>,
    },

    /// Stop after the current tick
    Shutdown,
}
