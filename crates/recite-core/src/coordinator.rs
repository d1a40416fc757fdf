//! Session lifecycle and fan-out.
//!
//! The coordinator owns everything a recording session shares: the
//! capture driver, the WAV sink, the recognition session, and the
//! snapshot channel observers read. It is the sole writer of published
//! state, so observers never see a half-applied update.

use crate::{
    AccessAuthorizer, AudioFrame, AudioSource, CaptureError, RecognitionBackend, RecognitionError,
    RecognitionSession, RecognitionUpdate, SessionError, TranscriptEvent, WavSink,
    access::AccessGrants,
    audio::source::CaptureDriver,
    error::Result as CoreResult,
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use error_location::ErrorLocation;
use tokio::{
    sync::{Mutex, OnceCell, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndCause {
    /// The caller asked for the stop.
    UserStopped,
    /// The backend delivered its final hypothesis.
    BackendFinal,
    /// The pipeline tore itself down after a failure.
    Error {
        /// User-facing description of the failure.
        message: String,
    },
}

/// Observer view of the current (or most recent) session.
///
/// Partial artifacts stay valid: after a failure the transcript and
/// audio path still describe whatever was captured before it.
#[derive(Debug, Clone, Default)]
pub struct CaptureSnapshot {
    /// Id of the session this snapshot describes.
    pub session_id: Option<Uuid>,
    /// Latest hypothesis; every event replaces the whole string.
    pub transcript: String,
    /// Where the session's audio is written.
    pub audio_path: Option<PathBuf>,
    /// Set exactly once when the session ends.
    pub ended: Option<EndCause>,
}

struct LiveSession {
    id: Uuid,
    source: Box<dyn CaptureDriver>,
    recognition: RecognitionSession,
    /// Coordinator-held halves of the fan-out channels. Dropped during
    /// teardown, after the capture callback's clones are detached, so
    /// each consumer observes end of input exactly once.
    sink_tx: Option<mpsc::UnboundedSender<AudioFrame>>,
    recognition_tx: Option<mpsc::UnboundedSender<AudioFrame>>,
    writer: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
    /// Checked by the pump before every publish; set first in teardown.
    cancelled: Arc<AtomicBool>,
    started_at: Instant,
}

impl LiveSession {
    /// Ordered detach: capture stops first, then the consumers learn
    /// end of audio, then recognition is cancelled, then the writer and
    /// pump are joined. After this returns the session has no further
    /// side effects.
    async fn teardown(&mut self) {
        self.cancelled.store(true, Ordering::Release);

        self.source.stop();
        self.sink_tx.take();
        self.recognition_tx.take();
        self.recognition.cancel().await;

        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                error!(error = %e, "Sink writer task panicked");
            }
        }
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                error!(error = %e, "Update pump task panicked");
            }
        }
    }
}

/// Owns at most one live capture session and the state it publishes.
///
/// Cheap to clone; clones share the same session slot and snapshot
/// channel.
#[derive(Clone)]
pub struct CaptureCoordinator {
    backend: Option<Arc<dyn RecognitionBackend>>,
    authorizer: Arc<dyn AccessAuthorizer>,
    source: AudioSource,
    /// Access checks resolve once per process; a denial stays denied.
    access: Arc<OnceCell<AccessGrants>>,
    live: Arc<Mutex<Option<LiveSession>>>,
    snapshot_tx: Arc<watch::Sender<CaptureSnapshot>>,
}

impl CaptureCoordinator {
    /// New coordinator with no active session.
    ///
    /// Passing `backend: None` makes every [`begin_session`] fail with
    /// [`RecognitionError::RecognizerMissing`].
    ///
    /// [`begin_session`]: CaptureCoordinator::begin_session
    pub fn new(
        backend: Option<Arc<dyn RecognitionBackend>>,
        authorizer: Arc<dyn AccessAuthorizer>,
        source: AudioSource,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(CaptureSnapshot::default());
        Self {
            backend,
            authorizer,
            source,
            access: Arc::new(OnceCell::new()),
            live: Arc::new(Mutex::new(None)),
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    /// Subscribe to published session state.
    pub fn snapshots(&self) -> watch::Receiver<CaptureSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current published state.
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Start a new capture session writing audio to `destination`.
    ///
    /// Fails with [`SessionError::AlreadyRecording`] while a session is
    /// active, leaving the active session untouched. The access checks
    /// run on first use and are cached for the life of the process.
    #[instrument(skip(self))]
    pub async fn begin_session(&self, destination: &Path) -> CoreResult<Uuid> {
        let mut live = self.live.lock().await;
        if live.is_some() {
            return Err(SessionError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let grants = self
            .access
            .get_or_init(|| async {
                let grants = AccessGrants {
                    microphone: self.authorizer.microphone_allowed().await,
                    recognition: self.authorizer.recognition_allowed().await,
                };
                info!(
                    microphone = grants.microphone,
                    recognition = grants.recognition,
                    "Access checks resolved"
                );
                grants
            })
            .await;

        if !grants.recognition {
            return Err(RecognitionError::NotAuthorized {
                location: ErrorLocation::from(Location::caller()),
            }
            .into());
        }
        if !grants.microphone {
            return Err(CaptureError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            }
            .into());
        }

        let backend = self
            .backend
            .clone()
            .ok_or(RecognitionError::RecognizerMissing {
                location: ErrorLocation::from(Location::caller()),
            })?;
        if !backend.is_available() {
            return Err(RecognitionError::RecognizerUnavailable {
                location: ErrorLocation::from(Location::caller()),
            }
            .into());
        }

        let source = self.source.driver()?;
        let format = source.format();
        let mut sink = WavSink::create(destination, format)?;

        let id = Uuid::new_v4();
        let cancelled = Arc::new(AtomicBool::new(false));

        // Fresh snapshot before the pump exists, so no event can land
        // in a stale one.
        self.snapshot_tx.send_replace(CaptureSnapshot {
            session_id: Some(id),
            transcript: String::new(),
            audio_path: Some(destination.to_path_buf()),
            ended: None,
        });

        // The writer drains its own channel so file I/O never blocks
        // capture. Write failures are logged and the session continues;
        // the recording is the recoverable half of the pipeline.
        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<AudioFrame>();
        let writer = tokio::spawn(async move {
            let mut reported = false;
            while let Some(frame) = sink_rx.recv().await {
                if let Err(e) = sink.write(&frame) {
                    if !reported {
                        warn!(error = %e, "Audio file write failed, transcription continues");
                        reported = true;
                    }
                }
            }
            if let Err(e) = sink.finish() {
                warn!(error = %e, "Audio file finalize failed");
            }
        });

        let (recognition, recognition_tx, updates) = RecognitionSession::start(backend);

        let pump = tokio::spawn(pump_updates(
            updates,
            self.clone(),
            Arc::clone(&cancelled),
        ));

        let mut session = LiveSession {
            id,
            source,
            recognition,
            sink_tx: Some(sink_tx.clone()),
            recognition_tx: Some(recognition_tx.clone()),
            writer: Some(writer),
            pump: Some(pump),
            cancelled,
            started_at: Instant::now(),
        };

        // Fan-out: both consumers get every frame, and neither blocks
        // the audio thread or the other consumer.
        let on_frame = move |frame: AudioFrame| {
            let _ = sink_tx.send(frame.clone());
            let _ = recognition_tx.send(frame);
        };

        if let Err(e) = session.source.start(Box::new(on_frame)) {
            warn!(error = %e, "Capture failed to start, unwinding session");
            session.teardown().await;
            let message = e.to_string();
            self.snapshot_tx.send_modify(|snapshot| {
                snapshot.ended = Some(EndCause::Error { message });
            });
            return Err(e.into());
        }

        *live = Some(session);
        info!(session_id = %id, path = ?destination, "Capture session began");

        Ok(id)
    }

    /// End the active session. Idempotent; a call with no active
    /// session is a no-op.
    pub async fn end_session(&self) {
        self.finish(EndCause::UserStopped).await;
    }

    /// Shared teardown for user stops, backend finals, and failures.
    #[instrument(skip(self))]
    async fn finish(&self, cause: EndCause) {
        let mut live = self.live.lock().await;
        let Some(mut session) = live.take() else {
            debug!("No active session to end");
            return;
        };

        session.teardown().await;

        info!(
            session_id = %session.id,
            duration_ms = session.started_at.elapsed().as_millis(),
            cause = ?cause,
            "Capture session ended"
        );

        self.snapshot_tx
            .send_modify(|snapshot| snapshot.ended = Some(cause));
    }
}

/// Forward recognition updates into the published snapshot. Runs until
/// the update stream ends or a terminal item arrives; terminal items
/// trigger the shared teardown.
async fn pump_updates(
    mut updates: mpsc::UnboundedReceiver<RecognitionUpdate>,
    coordinator: CaptureCoordinator,
    cancelled: Arc<AtomicBool>,
) {
    while let Some(update) = updates.recv().await {
        if cancelled.load(Ordering::Acquire) {
            break;
        }

        match update {
            RecognitionUpdate::Transcript(TranscriptEvent { text, is_final }) => {
                coordinator
                    .snapshot_tx
                    .send_modify(|snapshot| snapshot.transcript = text);
                if is_final {
                    debug!("Final hypothesis received, ending session");
                    spawn_finish(coordinator.clone(), EndCause::BackendFinal);
                    break;
                }
            }
            RecognitionUpdate::Failed(e) => {
                info!(error = %e, "Recognition failed, ending session");
                let message = e.user_message().to_string();
                spawn_finish(coordinator.clone(), EndCause::Error { message });
                break;
            }
        }
    }
}

fn spawn_finish(coordinator: CaptureCoordinator, cause: EndCause) {
    // Teardown joins the pump task, so it must not run on it.
    tokio::spawn(async move {
        coordinator.finish(cause).await;
    });
}
