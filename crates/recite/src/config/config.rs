//! Configuration management for recite.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, RecognitionConfig, ScoringConfig, StorageConfig},
};

use std::{fs, io::Write, panic::Location, path::PathBuf};

use crate::config::{DEFAULT_PACING_MS, DEFAULT_SCORING_ENDPOINT};
use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Audio capture configuration.
    pub audio: AudioConfig,
    /// Speech recognition configuration.
    pub recognition: RecognitionConfig,
    /// Pronunciation scoring service configuration.
    pub scoring: ScoringConfig,
    /// Storage location configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Directory all persistent data lives under.
    #[track_caller]
    pub fn data_dir(&self) -> AppResult<PathBuf> {
        let data_dir = match &self.storage.data_dir {
            Some(dir) => dir.clone(),
            None => {
                let proj_dirs = ProjectDirs::from("com", "recite", "Recite").ok_or_else(|| {
                    AppError::ConfigError {
                        reason: "Failed to get data directory".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    }
                })?;
                proj_dirs.data_dir().to_path_buf()
            }
        };

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
            debug!(data_dir = ?data_dir, "Created data directory");
        }

        Ok(data_dir)
    }

    /// Directory captured takes are written into.
    #[track_caller]
    pub fn recordings_dir(&self) -> AppResult<PathBuf> {
        let recordings_dir = self.data_dir()?.join("recordings");

        if !recordings_dir.exists() {
            fs::create_dir_all(&recordings_dir)?;
            debug!(recordings_dir = ?recordings_dir, "Created recordings directory");
        }

        Ok(recordings_dir)
    }

    /// File the topics and their recording history persist in.
    #[track_caller]
    pub fn topics_path(&self) -> AppResult<PathBuf> {
        Ok(self.data_dir()?.join("topics.json"))
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "recite", "Recite").ok_or_else(|| AppError::ConfigError {
                reason: "Failed to get config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let config = Config {
            audio: AudioConfig {
                input_device: None,
                synthetic: false,
            },
            recognition: RecognitionConfig {
                pacing_ms: DEFAULT_PACING_MS,
            },
            scoring: ScoringConfig {
                endpoint: DEFAULT_SCORING_ENDPOINT.to_string(),
            },
            storage: StorageConfig { data_dir: None },
        };

        config.save()?;

        info!("Default config created");

        Ok(config)
    }
}
