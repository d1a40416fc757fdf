//! Take playback through the default output device.

use crate::{AppError, AppResult};

use std::fs::File;
use std::io::BufReader;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use error_location::ErrorLocation;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument};

/// Events reported by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The take played to the end without being stopped.
    Finished,
}

/// Plays a banked take.
pub trait AudioPlayer: Send + Sync {
    /// Start playing the file at `path`, replacing any active playback.
    fn play(&self, path: &Path) -> AppResult<()>;

    /// Stop the active playback, if any.
    fn stop(&self);
}

struct ActivePlayback {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
}

/// [`AudioPlayer`] backed by rodio and the default output device.
pub struct RodioPlayer {
    events: UnboundedSender<PlaybackEvent>,
    active: Mutex<Option<ActivePlayback>>,
}

impl RodioPlayer {
    /// Create a player that reports on `events`.
    pub fn new(events: UnboundedSender<PlaybackEvent>) -> Self {
        Self {
            events,
            active: Mutex::new(None),
        }
    }
}

impl AudioPlayer for RodioPlayer {
    #[instrument(skip(self))]
    fn play(&self, path: &Path) -> AppResult<()> {
        self.stop();

        let file = File::open(path).map_err(|e| AppError::Playback {
            reason: format!("Failed to open {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let stopped = Arc::new(AtomicBool::new(false));
        let thread_stopped = Arc::clone(&stopped);
        let events = self.events.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        // The output stream is not Send and must outlive playback, so
        // the whole rodio pipeline lives on one thread.
        std::thread::spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(output) => output,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("Failed to open output device: {}", e)));
                    return;
                }
            };
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("Failed to create playback sink: {}", e)));
                    return;
                }
            };
            let source = match Decoder::new(BufReader::new(file)) {
                Ok(source) => source,
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("Failed to decode recording: {}", e)));
                    return;
                }
            };
            sink.append(source);
            if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
                return;
            }
            sink.sleep_until_end();
            // A user stop empties the sink too; only a full run reports.
            if !thread_stopped.load(Ordering::Acquire) {
                let _ = events.send(PlaybackEvent::Finished);
            }
        });

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(sink)) => {
                let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
                *active = Some(ActivePlayback { sink, stopped });
                debug!(path = ?path, "Playback started");
                Ok(())
            }
            Ok(Err(reason)) => Err(AppError::Playback {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(_) => Err(AppError::Playback {
                reason: "Playback did not start in time".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[instrument(skip(self))]
    fn stop(&self) {
        let taken = {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            active.take()
        };
        if let Some(playback) = taken {
            playback.stopped.store(true, Ordering::Release);
            playback.sink.stop();
            debug!("Playback stopped");
        }
    }
}
