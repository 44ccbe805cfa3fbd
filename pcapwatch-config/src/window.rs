//! Reporting window configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Aggregation window parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct WindowConfig {
    /// Window length in milliseconds; one report is emitted per window.
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl WindowConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}
