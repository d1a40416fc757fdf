mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod recognition_config;
mod scoring_config;
mod storage_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, recognition_config::RecognitionConfig,
    scoring_config::ScoringConfig, storage_config::StorageConfig,
};

pub(crate) const DEFAULT_PACING_MS: u64 = 400;
pub(crate) const DEFAULT_SCORING_ENDPOINT: &str = "http://localhost:8077/grade";

pub(crate) fn default_pacing_ms() -> u64 {
    DEFAULT_PACING_MS
}

pub(crate) fn default_scoring_endpoint() -> String {
    DEFAULT_SCORING_ENDPOINT.to_string()
}
