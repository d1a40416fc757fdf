use crate::config::default_scoring_endpoint;
use serde::{Deserialize, Serialize};

/// Pronunciation scoring service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// URL the transcript is posted to for scoring.
    #[serde(default = "default_scoring_endpoint")]
    pub endpoint: String,
}
