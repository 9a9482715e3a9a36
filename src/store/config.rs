//! Store configuration

use std::time::Duration;

/// Configuration for the in-memory session store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Viewers with no heartbeat for this long are removed by the sweep
    pub viewer_timeout: Duration,

    /// Interval between inactivity sweeps
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            // Protocol constant: Unreal clients heartbeat well inside 30s
            viewer_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(10),
        }
    }
}

impl StoreConfig {
    /// Set the viewer inactivity timeout
    pub fn viewer_timeout(mut self, timeout: Duration) -> Self {
        self.viewer_timeout = timeout;
        self
    }

    /// Set the sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}
