pub mod actors;
pub mod api;
pub mod config;
pub mod error;
pub mod logs;
pub mod metrics;
pub mod notifier;
pub mod probe;
pub mod render;

pub use actors::messages::{Panel, RenderPayload};
pub use error::{ConfigError, DashboardError, DashboardResult};
pub use metrics::{ChartSpec, MetricSample, MetricsClient};
pub use notifier::{AlertEvent, AlertNotifier};
pub use probe::{AddressRange, ProbeOutcome, ProbeResult, ReachabilityProbe};
