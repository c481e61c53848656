//! Actor driving the periodic refresh
//!
//! ## Architecture Overview
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │  main / HTTP API │
//!                 └────────┬─────────┘
//!                          │ RefreshHandle (mpsc commands)
//!                 ┌────────▼─────────┐
//!                 │   RefreshActor   │──▶ MetricsClient, LogTailer,
//!                 └────────┬─────────┘    ReachabilityProbe, AlertNotifier
//!                          │
//!             ┌────────────┴────────────┐
//!             │                         │
//!     ┌───────▼───────┐       ┌─────────▼─────────┐
//!     │ PayloadStore  │       │ Broadcast Channel │ (RenderPayload)
//!     └───────────────┘       └───────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor has an mpsc command channel for control messages
//! 2. **Events**: each finished tick is published to a broadcast channel
//! 3. **Request/Response**: oneshot channels for `RefreshNow`

pub mod messages;
pub mod refresh;
