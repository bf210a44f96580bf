use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sensorhub_frame::HubConfig;

use crate::error::{Result, RuntimeError};

/// Recovery scheduling knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Delay before a recovery requested by timeout escalation runs.
    pub delay_ms: u64,
    /// Consecutive transport timeouts that trigger a recovery request.
    pub timeout_limit: u32,
}

impl RecoveryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            timeout_limit: 3,
        }
    }
}

/// Everything a session needs, as loaded from `--config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub hub: HubConfig,
    pub recovery: RecoveryConfig,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RuntimeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
