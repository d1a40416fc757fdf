//! Continuous recognition session supervision.
//!
//! A [`RecognitionBackend`] is one streaming speech-to-text call; a
//! [`RecognitionSession`] wraps it in a supervised task pair enforcing
//! the event contract: hypotheses arrive in order, and the stream ends
//! with at most one terminal item (a final hypothesis or a failure),
//! never both.

use crate::{AudioFrame, RecognitionError};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, error, info, instrument};

/// One transcription hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEvent {
    /// Full replacement for any previous hypothesis, never a delta.
    pub text: String,
    /// Marks the hypothesis that ends the session.
    pub is_final: bool,
}

/// Everything a running session delivers to its observer.
#[derive(Debug)]
pub enum RecognitionUpdate {
    /// A partial or final hypothesis.
    Transcript(TranscriptEvent),
    /// Terminal failure. Nothing follows it.
    Failed(RecognitionError),
}

/// A streaming speech-to-text implementation.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Whether a session can start right now. Transient; checked at
    /// session start only.
    fn is_available(&self) -> bool {
        true
    }

    /// Run one continuous recognition call: consume `audio` until the
    /// channel closes, emitting hypotheses on `events` in order with
    /// `is_final` set on at most the last one. Returning an error ends
    /// the session with that error instead.
    async fn run(
        &self,
        audio: mpsc::UnboundedReceiver<AudioFrame>,
        events: mpsc::UnboundedSender<TranscriptEvent>,
    ) -> Result<(), RecognitionError>;
}

/// Supervised handle over one backend call.
///
/// Audio goes in through the sender returned by [`start`]; dropping
/// every clone of it signals end of audio. Updates come out of the
/// receiver, ending with at most one terminal item.
///
/// [`start`]: RecognitionSession::start
pub struct RecognitionSession {
    /// Once set, the supervisor publishes nothing further.
    cancelled: Arc<AtomicBool>,
    runner_abort: AbortHandle,
    supervisor: Option<JoinHandle<()>>,
}

impl RecognitionSession {
    /// Launch `backend` and the supervising forward loop.
    #[instrument(skip(backend))]
    pub fn start(
        backend: Arc<dyn RecognitionBackend>,
    ) -> (
        Self,
        mpsc::UnboundedSender<AudioFrame>,
        mpsc::UnboundedReceiver<RecognitionUpdate>,
    ) {
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let runner = tokio::spawn(async move { backend.run(audio_rx, event_tx).await });
        let runner_abort = runner.abort_handle();
        let supervisor = tokio::spawn(supervise(
            event_rx,
            update_tx,
            runner,
            Arc::clone(&cancelled),
        ));

        debug!("Recognition session started");

        (
            Self {
                cancelled,
                runner_abort,
                supervisor: Some(supervisor),
            },
            audio_tx,
            update_rx,
        )
    }

    /// Stop the backend call. No update is delivered after this
    /// returns. Idempotent, and safe to race with in-flight events.
    #[instrument(skip(self))]
    pub async fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        self.runner_abort.abort();

        if let Some(supervisor) = self.supervisor.take() {
            if let Err(e) = supervisor.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Recognition supervisor panicked");
                }
            }
            debug!("Recognition session cancelled");
        }
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        // A dropped session must not leave the backend call running.
        self.runner_abort.abort();
    }
}

/// Forward backend events to the observer until the first terminal
/// item, checking the cancellation flag before every send.
async fn supervise(
    mut events: mpsc::UnboundedReceiver<TranscriptEvent>,
    updates: mpsc::UnboundedSender<RecognitionUpdate>,
    runner: JoinHandle<Result<(), RecognitionError>>,
    cancelled: Arc<AtomicBool>,
) {
    loop {
        let Some(event) = events.recv().await else {
            // The backend returned and dropped its sender. An Err
            // becomes the session's single terminal update.
            match runner.await {
                Ok(Ok(())) => debug!("Recognition backend ended without a final hypothesis"),
                Ok(Err(e)) => {
                    info!(error = %e, "Recognition backend failed");
                    if !cancelled.load(Ordering::Acquire) {
                        let _ = updates.send(RecognitionUpdate::Failed(e));
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(error = %e, "Recognition backend task panicked"),
            }
            return;
        };

        if cancelled.load(Ordering::Acquire) {
            break;
        }

        let is_final = event.is_final;
        if updates.send(RecognitionUpdate::Transcript(event)).is_err() {
            break;
        }
        if is_final {
            break;
        }
    }

    // Forwarding ended on this side: a final went out, the session was
    // cancelled, or the observer went away. The backend call has
    // nothing left to deliver.
    runner.abort();
    let _ = runner.await;
}

/// One scripted action for [`ScriptedRecognizer`].
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a partial hypothesis.
    Partial(String),
    /// Emit the final hypothesis and end the session.
    Final(String),
    /// Fail the session with [`RecognitionError::RecognizerUnavailable`].
    Fail,
}

/// Scripted playback of a recognition session.
///
/// Development stand-in for a real speech-to-text service: replays a
/// fixed sequence of hypotheses at a steady pace while draining (and
/// ignoring) captured audio. The script can be swapped between
/// sessions, so one instance serves many takes.
pub struct ScriptedRecognizer {
    script: Mutex<Vec<ScriptStep>>,
    pacing: Duration,
}

impl ScriptedRecognizer {
    /// New recognizer replaying `script` with `pacing` between steps.
    pub fn new(script: Vec<ScriptStep>, pacing: Duration) -> Self {
        Self {
            script: Mutex::new(script),
            pacing,
        }
    }

    /// Replace the script for the next session.
    pub fn set_script(&self, script: Vec<ScriptStep>) {
        *self.script.lock().unwrap_or_else(|e| e.into_inner()) = script;
    }
}

#[async_trait]
impl RecognitionBackend for ScriptedRecognizer {
    async fn run(
        &self,
        mut audio: mpsc::UnboundedReceiver<AudioFrame>,
        events: mpsc::UnboundedSender<TranscriptEvent>,
    ) -> Result<(), RecognitionError> {
        let script = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let mut audio_open = true;

        for step in script {
            // Pace the next hypothesis while draining captured audio so
            // the ingest channel never accumulates.
            let deadline = tokio::time::sleep(self.pacing);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    () = &mut deadline => break,
                    frame = audio.recv(), if audio_open => {
                        if frame.is_none() {
                            audio_open = false;
                        }
                    }
                }
            }

            match step {
                ScriptStep::Partial(text) => {
                    let event = TranscriptEvent {
                        text,
                        is_final: false,
                    };
                    if events.send(event).is_err() {
                        return Ok(());
                    }
                }
                ScriptStep::Final(text) => {
                    let _ = events.send(TranscriptEvent {
                        text,
                        is_final: true,
                    });
                    return Ok(());
                }
                ScriptStep::Fail => {
                    return Err(RecognitionError::RecognizerUnavailable {
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }

        Ok(())
    }
}
