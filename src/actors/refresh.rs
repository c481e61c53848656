//! RefreshActor - runs the dashboard pipeline on a fixed interval
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → DNS query → Traefik query → tail log → probe → (alert) → publish RenderPayload
//!     ↑
//!     └─── Commands (RefreshNow, Shutdown)
//! ```
//!
//! Ticks run one after another on the actor's task. A tick that outlasts the
//! interval causes the missed ticks to be skipped, never queued or overlapped.
//! Shutdown is only observed between ticks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, trace};

use crate::config::{ChartsConfig, ResolvedConfig};
use crate::error::DashboardResult;
use crate::logs::LogTailer;
use crate::metrics::MetricsClient;
use crate::notifier::{AlertEvent, AlertNotifier};
use crate::probe::{ProbeResult, ReachabilityProbe};

use super::messages::{Panel, RefreshCommand, RenderPayload};

/// Latest payload, shared with the HTTP server
#[derive(Debug, Clone, Default)]
pub struct PayloadStore {
    latest: Arc<RwLock<Option<RenderPayload>>>,
}

impl PayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, payload: RenderPayload) {
        *self.latest.write().await = Some(payload);
    }

    pub async fn latest(&self) -> Option<RenderPayload> {
        self.latest.read().await.clone()
    }
}

/// Text of the accessibility status line
pub fn status_line(probe: &ProbeResult, region: &str) -> String {
    if probe.is_reachable() {
        format!("Server is accessible from {region}")
    } else {
        format!("Server is not accessible from {region}")
    }
}

pub struct RefreshActor {
    metrics: MetricsClient,
    tailer: LogTailer,
    probe: ReachabilityProbe,
    notifier: AlertNotifier,
    charts: ChartsConfig,
    domain: String,
    region: String,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<RefreshCommand>,

    /// Broadcast sender for finished payloads
    payload_tx: broadcast::Sender<RenderPayload>,

    store: PayloadStore,
    interval_duration: Duration,

    /// Number of the next tick
    tick: u64,
}

impl RefreshActor {
    pub fn new(
        config: &ResolvedConfig,
        command_rx: mpsc::Receiver<RefreshCommand>,
        payload_tx: broadcast::Sender<RenderPayload>,
        store: PayloadStore,
    ) -> DashboardResult<Self> {
        Ok(Self {
            metrics: MetricsClient::new(&config.metrics)?,
            tailer: LogTailer::new(&config.log),
            probe: ReachabilityProbe::new(&config.probe)?,
            notifier: AlertNotifier::new(&config.notifier)?,
            charts: config.charts.clone(),
            domain: config.domain.clone(),
            region: config.probe.region.clone(),
            command_rx,
            payload_tx,
            store,
            interval_duration: config.interval,
            tick: 0,
        })
    }

    /// Run the actor's main loop
    ///
    /// The first tick fires immediately. Runs until a Shutdown command is
    /// received or every handle has been dropped.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting refresh actor");

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RefreshCommand::RefreshNow { respond_to }) => {
                            debug!("received RefreshNow command");
                            let payload = self.refresh().await;
                            let _ = respond_to.send(payload);
                        }

                        Some(RefreshCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            debug!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("refresh actor stopped");
    }

    /// Execute one tick and publish its payload
    #[instrument(skip(self), fields(tick = self.tick))]
    pub async fn refresh(&mut self) -> RenderPayload {
        let tick = self.tick;
        self.tick += 1;

        trace!("refreshing");

        let dns = Panel::from_result("dns chart", self.metrics.query_chart(&self.charts.dns).await);
        let traefik = Panel::from_result(
            "traefik chart",
            self.metrics.query_chart(&self.charts.traefik).await,
        );
        let logs = Panel::from_result("access log", self.tailer.tail().await);

        let probe = self.probe.probe().await;
        let alert = if probe.is_reachable() {
            None
        } else {
            info!("{} unreachable, sending alert", probe.address);
            let event = AlertEvent::inaccessible(&self.domain, &self.region);
            self.notifier.notify_event(&event).await;
            Some(event)
        };

        let payload = RenderPayload {
            tick,
            generated_at: Utc::now(),
            dns,
            traefik,
            logs,
            status: status_line(&probe, &self.region),
            probe,
            alert,
        };

        self.store.publish(payload.clone()).await;

        // It's OK if there are no subscribers.
        match self.payload_tx.send(payload.clone()) {
            Ok(num_receivers) => trace!("published payload to {num_receivers} receivers"),
            Err(_) => trace!("no receivers for payload"),
        }

        payload
    }
}

/// Handle for controlling a RefreshActor
#[derive(Clone)]
pub struct RefreshHandle {
    sender: mpsc::Sender<RefreshCommand>,
    payload_tx: broadcast::Sender<RenderPayload>,
    store: PayloadStore,
}

impl RefreshHandle {
    /// Build the actor from `config` and spawn it as a tokio task
    pub fn spawn(
        config: &ResolvedConfig,
        payload_tx: broadcast::Sender<RenderPayload>,
    ) -> DashboardResult<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let store = PayloadStore::new();

        let actor = RefreshActor::new(config, cmd_rx, payload_tx.clone(), store.clone())?;

        tokio::spawn(actor.run());

        Ok(Self {
            sender: cmd_tx,
            payload_tx,
            store,
        })
    }

    /// Receive every payload published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RenderPayload> {
        self.payload_tx.subscribe()
    }

    /// Run a tick now and wait for its payload
    pub async fn refresh_now(&self) -> Result<RenderPayload> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RefreshCommand::RefreshNow { respond_to: tx })
            .await
            .context("failed to send RefreshNow command")?;

        rx.await.context("failed to receive response")
    }

    /// Payload of the most recent finished tick
    pub async fn latest(&self) -> Option<RenderPayload> {
        self.store.latest().await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RefreshCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
