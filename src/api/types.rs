//! API response types

use serde::{Deserialize, Serialize};

/// Response for GET /api/v1/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,

    /// Tick number of the latest payload, if any tick has finished
    pub last_tick: Option<u64>,
}
