use serde::{Deserialize, Serialize};

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected input device name (None = default device).
    #[serde(default)]
    pub input_device: Option<String>,
    /// Use the synthetic audio source instead of a microphone.
    #[serde(default)]
    pub synthetic: bool,
}
