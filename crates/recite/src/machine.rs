//! Recording session lifecycle.
//!
//! [`SessionMachine`] owns the state of one practice run: recording a
//! take, playing it back, and uploading the transcript for scoring.
//! Every operation validates against the transition table first and
//! commits the new state only after its side effects succeed.

use crate::{
    AppError, AppResult, AudioPlayer, PracticeTimer, PronunciationFeedback,
    RecordingHistoryEntry, SpeechScorer,
};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use error_location::ErrorLocation;
use recite_core::{CaptureCoordinator, CaptureSnapshot};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Outcome of a scoring upload, delivered on the scoring channel.
pub type ScoringOutcome = Result<PronunciationFeedback, String>;

/// Lifecycle states of a practice run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No take yet, ready to start.
    ReadyToRecord,
    /// Capturing audio and live transcript.
    Recording,
    /// A take is banked and can be played, redone, or uploaded.
    FinishedRecording,
    /// The banked take is playing back.
    Playing,
    /// The transcript is out for pronunciation scoring.
    Uploading,
    /// Scoring feedback is in.
    Uploaded,
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Begin the first take.
    Start,
    /// Stop the active take.
    Stop,
    /// Play the banked take.
    Play,
    /// Stop playback early.
    StopPlaying,
    /// Playback ran to the end.
    PlaybackFinished,
    /// Discard the banked take and record again.
    ReRecord,
    /// Send the transcript for scoring.
    Upload,
    /// Scoring feedback arrived.
    ScoringFinished,
}

impl RecordingState {
    /// Next state for `event`, or `None` when the pair is illegal.
    pub fn apply(self, event: SessionEvent) -> Option<RecordingState> {
        match (self, event) {
            (RecordingState::ReadyToRecord, SessionEvent::Start) => Some(RecordingState::Recording),
            (RecordingState::Recording, SessionEvent::Stop) => {
                Some(RecordingState::FinishedRecording)
            }
            (RecordingState::FinishedRecording, SessionEvent::Play) => Some(RecordingState::Playing),
            (RecordingState::FinishedRecording, SessionEvent::ReRecord) => {
                Some(RecordingState::Recording)
            }
            (RecordingState::FinishedRecording, SessionEvent::Upload) => {
                Some(RecordingState::Uploading)
            }
            (RecordingState::Playing, SessionEvent::StopPlaying) => {
                Some(RecordingState::FinishedRecording)
            }
            (RecordingState::Playing, SessionEvent::PlaybackFinished) => {
                Some(RecordingState::FinishedRecording)
            }
            (RecordingState::Uploading, SessionEvent::ScoringFinished) => {
                Some(RecordingState::Uploaded)
            }
            (RecordingState::Uploaded, SessionEvent::ReRecord) => {
                Some(RecordingState::Recording)
            }
            _ => None,
        }
    }
}

/// State machine for one practice run against a topic.
pub struct SessionMachine {
    state: RecordingState,
    coordinator: CaptureCoordinator,
    player: Arc<dyn AudioPlayer>,
    scorer: Arc<dyn SpeechScorer>,
    recordings_dir: PathBuf,
    scoring_tx: UnboundedSender<ScoringOutcome>,
    timer: PracticeTimer,
    last_take: Option<PathBuf>,
    last_transcript: Option<String>,
    last_feedback: Option<PronunciationFeedback>,
}

impl SessionMachine {
    /// Create a machine in the ready state.
    pub fn new(
        coordinator: CaptureCoordinator,
        player: Arc<dyn AudioPlayer>,
        scorer: Arc<dyn SpeechScorer>,
        recordings_dir: PathBuf,
        scoring_tx: UnboundedSender<ScoringOutcome>,
    ) -> Self {
        Self {
            state: RecordingState::ReadyToRecord,
            coordinator,
            player,
            scorer,
            recordings_dir,
            scoring_tx,
            timer: PracticeTimer::new(),
            last_take: None,
            last_transcript: None,
            last_feedback: None,
        }
    }

    /// Begin the first take, with `minutes` on the practice timer.
    #[instrument(skip(self))]
    pub async fn start(&mut self, minutes: u8) -> AppResult<()> {
        let next = self.transition(SessionEvent::Start)?;
        self.begin_take(minutes).await?;
        self.state = next;
        Ok(())
    }

    /// Discard the banked take and record a fresh one.
    #[instrument(skip(self))]
    pub async fn re_record(&mut self, minutes: u8) -> AppResult<()> {
        let next = self.transition(SessionEvent::ReRecord)?;
        self.begin_take(minutes).await?;
        self.last_take = None;
        self.last_transcript = None;
        self.last_feedback = None;
        self.state = next;
        Ok(())
    }

    /// Stop the active take and bank it.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> AppResult<RecordingHistoryEntry> {
        let next = self.transition(SessionEvent::Stop)?;
        self.coordinator.end_session().await;
        self.timer.stop();
        let snapshot = self.coordinator.snapshot();
        let entry = self.bank(&snapshot);
        self.state = next;
        info!(has_audio = entry.audio_path.is_some(), "Take banked");
        Ok(entry)
    }

    /// Bank the take after the capture pipeline ended on its own.
    ///
    /// Returns `None` when nothing was recording, which is the normal
    /// case after a user stop already banked the take.
    pub fn pipeline_ended(&mut self) -> Option<RecordingHistoryEntry> {
        let next = self.state.apply(SessionEvent::Stop)?;
        self.timer.stop();
        let snapshot = self.coordinator.snapshot();
        let entry = self.bank(&snapshot);
        self.state = next;
        Some(entry)
    }

    /// Play the banked take back.
    pub fn play(&mut self) -> AppResult<()> {
        let next = self.transition(SessionEvent::Play)?;
        let Some(path) = self.last_take.clone() else {
            return Err(AppError::Playback {
                reason: "No banked take to play".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        self.player.play(&path)?;
        self.state = next;
        Ok(())
    }

    /// Stop playback early.
    pub fn stop_playing(&mut self) -> AppResult<()> {
        let next = self.transition(SessionEvent::StopPlaying)?;
        self.player.stop();
        self.state = next;
        Ok(())
    }

    /// Note that playback ran to the end.
    ///
    /// Returns `false` for an event that arrives after the user already
    /// stopped playback.
    pub fn playback_finished(&mut self) -> bool {
        let Some(next) = self.state.apply(SessionEvent::PlaybackFinished) else {
            return false;
        };
        self.state = next;
        true
    }

    /// Send the banked transcript for scoring against `passage`.
    ///
    /// The result arrives on the scoring channel as a [`ScoringOutcome`];
    /// [`Self::complete_upload`] or [`Self::scoring_failed`] settles it.
    #[instrument(skip(self, passage))]
    pub fn upload(&mut self, passage: &str) -> AppResult<()> {
        let next = self.transition(SessionEvent::Upload)?;
        let Some(recognized) = self.last_transcript.clone() else {
            return Err(AppError::Scoring {
                reason: "No transcript to score".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        let scorer = Arc::clone(&self.scorer);
        let results = self.scoring_tx.clone();
        let original = passage.to_string();
        tokio::spawn(async move {
            let outcome = scorer
                .score(&original, &recognized)
                .await
                .map_err(|e| e.to_string());
            if results.send(outcome).is_err() {
                warn!("Scoring result dropped, receiver is gone");
            }
        });
        self.state = next;
        Ok(())
    }

    /// Bank the scoring feedback.
    ///
    /// Returns `false` for a result that arrives after the run moved on.
    pub fn complete_upload(&mut self, feedback: PronunciationFeedback) -> bool {
        let Some(next) = self.state.apply(SessionEvent::ScoringFinished) else {
            return false;
        };
        self.last_feedback = Some(feedback);
        self.state = next;
        true
    }

    /// Rewind a failed upload so the take can be retried.
    ///
    /// Failure is not a table transition; it puts the run back where
    /// the upload started. Returns `false` when no upload was in flight.
    pub fn scoring_failed(&mut self) -> bool {
        if self.state != RecordingState::Uploading {
            return false;
        }
        self.state = RecordingState::FinishedRecording;
        true
    }

    /// Clear the banked take, ready for another topic.
    ///
    /// Returns `false` while a take, playback, or upload is still active.
    pub fn reset(&mut self) -> bool {
        match self.state {
            RecordingState::ReadyToRecord
            | RecordingState::FinishedRecording
            | RecordingState::Uploaded => {
                self.state = RecordingState::ReadyToRecord;
                self.last_take = None;
                self.last_transcript = None;
                self.last_feedback = None;
                true
            }
            RecordingState::Recording | RecordingState::Playing | RecordingState::Uploading => {
                false
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Scoring feedback for the banked take, once an upload settled.
    pub fn feedback(&self) -> Option<&PronunciationFeedback> {
        self.last_feedback.as_ref()
    }

    /// Audio file of the banked take.
    pub fn last_take(&self) -> Option<&Path> {
        self.last_take.as_deref()
    }

    /// Practice timer for the active take.
    pub fn timer(&self) -> &PracticeTimer {
        &self.timer
    }

    /// Next state for `event`, or the error naming the illegal pair.
    #[track_caller]
    fn transition(&self, event: SessionEvent) -> AppResult<RecordingState> {
        match self.state.apply(event) {
            Some(next) => Ok(next),
            None => Err(AppError::IllegalTransition {
                state: self.state,
                event,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Start capture into a fresh file and arm the practice timer.
    async fn begin_take(&mut self, minutes: u8) -> AppResult<()> {
        let destination = self.recordings_dir.join(format!("{}.wav", Uuid::new_v4()));
        self.coordinator.begin_session(&destination).await?;
        self.timer.start(u64::from(minutes) * 60);
        Ok(())
    }

    /// Record the capture snapshot as the banked take.
    fn bank(&mut self, snapshot: &CaptureSnapshot) -> RecordingHistoryEntry {
        let entry = RecordingHistoryEntry::from_snapshot(snapshot);
        self.last_take = entry.audio_path.clone();
        self.last_transcript = entry.transcript.clone();
        entry
    }
}
