//! Persistent topic storage.

use crate::{AppError, AppResult, PracticeTopic};

use std::fs::File;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use tracing::{info, instrument, warn};

/// Topics and their recording history, persisted as JSON.
pub struct TopicStore {
    topics: Vec<PracticeTopic>,
    path: PathBuf,
}

impl TopicStore {
    /// Load topics from `path`, falling back to the built-in samples
    /// when the file is missing or unreadable.
    #[instrument]
    pub fn load(path: &Path) -> Self {
        let topics = match Self::read_from(path) {
            Ok(Some(topics)) => {
                info!(count = topics.len(), path = ?path, "Topics loaded");
                topics
            }
            Ok(None) => {
                info!(path = ?path, "No topic file yet, starting with samples");
                PracticeTopic::sample_topics()
            }
            Err(e) => {
                warn!(error = %e, path = ?path, "Topic file unreadable, starting with samples");
                PracticeTopic::sample_topics()
            }
        };
        Self {
            topics,
            path: path.to_path_buf(),
        }
    }

    /// All topics, in display order.
    pub fn topics(&self) -> &[PracticeTopic] {
        &self.topics
    }

    /// Mutable access for banking takes.
    pub fn topics_mut(&mut self) -> &mut Vec<PracticeTopic> {
        &mut self.topics
    }

    /// Write all topics back to disk.
    #[instrument(skip(self))]
    pub fn save(&self) -> AppResult<()> {
        self.write_to(&self.path)?;
        info!(count = self.topics.len(), path = ?self.path, "Topics saved");
        Ok(())
    }

    fn read_from(path: &Path) -> AppResult<Option<Vec<PracticeTopic>>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let topics = serde_json::from_str(&contents).map_err(|e| AppError::Store {
            reason: format!("Failed to parse topic file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(Some(topics))
    }

    fn write_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.topics).map_err(|e| AppError::Store {
            reason: format!("Failed to serialize topics: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}
