//! History of completed takes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use recite_core::CaptureSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed take against a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingHistoryEntry {
    /// Stable identity across saves.
    pub id: Uuid,
    /// When the take finished.
    pub recorded_at: DateTime<Utc>,
    /// Recognized speech, when the recognizer produced any.
    pub transcript: Option<String>,
    /// Captured audio file, when one was written.
    pub audio_path: Option<PathBuf>,
}

impl RecordingHistoryEntry {
    /// Build an entry from the final capture snapshot.
    pub fn from_snapshot(snapshot: &CaptureSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            transcript: (!snapshot.transcript.is_empty()).then(|| snapshot.transcript.clone()),
            audio_path: snapshot.audio_path.clone(),
        }
    }
}
