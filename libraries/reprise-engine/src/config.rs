/// Engine configuration
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Time-sampling cadence in milliseconds
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u64,
}

fn default_sampling_interval_ms() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: default_sampling_interval_ms(),
        }
    }
}

impl EngineConfig {
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_millis(self.sampling_interval_ms.max(1))
    }
}
