use crate::config::default_pacing_ms;
use serde::{Deserialize, Serialize};

/// Speech recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Milliseconds between transcript events from the recognizer.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}
