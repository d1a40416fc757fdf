//! Pronunciation scoring over HTTP.

use crate::{AppError, AppResult};

use std::panic::Location;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// One passage fragment with its pronunciation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    /// Fragment of the reading passage.
    pub original: String,
    /// What the recognizer heard for it.
    pub recognized: String,
    /// Score in `0.0..=1.0`.
    pub score: f32,
}

/// Scoring feedback for a whole take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationFeedback {
    /// Per-fragment scores, in passage order.
    pub fragments: Vec<ScoredFragment>,
    /// Mean of the fragment scores, `0.0` when there are none.
    pub average_score: f32,
}

impl PronunciationFeedback {
    /// Fold fragments into feedback with their average score.
    pub fn from_fragments(fragments: Vec<ScoredFragment>) -> Self {
        let average_score = if fragments.is_empty() {
            0.0
        } else {
            fragments.iter().map(|f| f.score).sum::<f32>() / fragments.len() as f32
        };
        Self {
            fragments,
            average_score,
        }
    }
}

/// Request body for the scoring service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScoreRequest<'a> {
    pub(crate) original_text: &'a str,
    pub(crate) recognized_text: &'a str,
}

/// Scores recognized speech against the passage it came from.
#[async_trait]
pub trait SpeechScorer: Send + Sync {
    /// Score `recognized` against the `original` passage.
    async fn score(&self, original: &str, recognized: &str) -> AppResult<PronunciationFeedback>;
}

/// [`SpeechScorer`] backed by the HTTP scoring service.
pub struct PronunciationScorer {
    client: reqwest::Client,
    endpoint: String,
}

impl PronunciationScorer {
    /// Build a scorer that posts to `endpoint`.
    pub fn new(endpoint: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::Scoring {
                reason: format!("Failed to build HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl SpeechScorer for PronunciationScorer {
    #[instrument(skip(self, original, recognized))]
    async fn score(&self, original: &str, recognized: &str) -> AppResult<PronunciationFeedback> {
        let request = ScoreRequest {
            original_text: original,
            recognized_text: recognized,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Scoring {
                reason: format!("Scoring request failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .error_for_status()
            .map_err(|e| AppError::Scoring {
                reason: format!("Scoring service rejected the request: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let fragments: Vec<ScoredFragment> =
            response.json().await.map_err(|e| AppError::Scoring {
                reason: format!("Scoring response unreadable: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let feedback = PronunciationFeedback::from_fragments(fragments);
        info!(
            fragments = feedback.fragments.len(),
            average_score = f64::from(feedback.average_score),
            "Scoring finished"
        );
        Ok(feedback)
    }
}
