//! API shared state

use crate::actors::refresh::RefreshHandle;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Handle to the refresh actor (latest payload, manual refresh)
    pub refresh: RefreshHandle,

    /// Page reload period, matching the refresh interval
    pub refresh_interval_secs: u64,
}

impl ApiState {
    pub fn new(refresh: RefreshHandle, refresh_interval_secs: u64) -> Self {
        Self {
            refresh,
            refresh_interval_secs,
        }
    }
}
