use serde::Deserialize;

/// Per-session hub configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Label attached to log lines and bulk jobs from this session.
    pub session_name: String,
    /// Register decoders for the optical heart-rate sensors.
    pub heart_rate_enabled: bool,
    /// Register jobs for the voice bulk types.
    pub voice_enabled: bool,
    /// Start with low-power/gesture mode active.
    pub low_power_mode: bool,
    /// Largest transfer accepted from the transport.
    pub max_transfer_size: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            session_name: "hub0".to_string(),
            heart_rate_enabled: true,
            voice_enabled: true,
            low_power_mode: false,
            max_transfer_size: u16::MAX as usize,
        }
    }
}
