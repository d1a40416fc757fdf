//! Recite: English speaking practice with live transcription and
//! pronunciation scoring.

mod app;
mod config;
mod error;
mod history;
mod machine;
mod playback;
mod scoring;
mod store;
#[cfg(test)]
mod tests;
mod timer;
mod topic;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
    history::RecordingHistoryEntry,
    machine::{RecordingState, ScoringOutcome, SessionEvent, SessionMachine},
    playback::{AudioPlayer, PlaybackEvent, RodioPlayer},
    scoring::{PronunciationFeedback, PronunciationScorer, SpeechScorer},
    store::TopicStore,
    timer::PracticeTimer,
    topic::PracticeTopic,
};

use crate::config::Config;

use std::sync::Arc;
use std::time::Duration;

use recite_core::{
    AudioSource, CaptureCoordinator, FrameFormat, RecognitionBackend, ScriptedRecognizer,
    SystemAuthorizer,
};
use tokio::sync::mpsc;
use tracing::error;

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("recite=info,recite_core=info")
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let recordings_dir = match config.recordings_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Failed to prepare recordings directory: {:?}", e);
                std::process::exit(1);
            }
        };

        let topics_path = match config.topics_path() {
            Ok(path) => path,
            Err(e) => {
                error!("Failed to resolve topics path: {:?}", e);
                std::process::exit(1);
            }
        };

        // The recognizer replays the current topic's passage; the app
        // loads a script into it before each take.
        let scripted = Arc::new(ScriptedRecognizer::new(
            Vec::new(),
            Duration::from_millis(config.recognition.pacing_ms),
        ));

        let source = if config.audio.synthetic {
            AudioSource::Synthetic {
                format: FrameFormat {
                    sample_rate: 16_000,
                    channels: 1,
                },
                frame_len: 512,
                cadence: Duration::from_millis(20),
            }
        } else {
            AudioSource::Microphone {
                device: config.audio.input_device.clone(),
            }
        };

        let coordinator = CaptureCoordinator::new(
            Some(Arc::clone(&scripted) as Arc<dyn RecognitionBackend>),
            Arc::new(SystemAuthorizer),
            source,
        );
        let snapshots = coordinator.snapshots();

        let (playback_tx, playback_rx) = mpsc::unbounded_channel();
        let (scoring_tx, scoring_rx) = mpsc::unbounded_channel();

        let player: Arc<dyn AudioPlayer> = Arc::new(RodioPlayer::new(playback_tx));

        let scorer = match PronunciationScorer::new(&config.scoring.endpoint) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                error!("Failed to create scorer: {:?}", e);
                std::process::exit(1);
            }
        };

        let machine = SessionMachine::new(
            coordinator,
            Arc::clone(&player),
            scorer,
            recordings_dir,
            scoring_tx,
        );
        let store = TopicStore::load(&topics_path);

        let app = App {
            machine,
            store,
            current_topic: 0,
            snapshots,
            scoring_rx,
            playback_rx,
            player,
            scripted,
        };

        if let Err(e) = app.run().await {
            error!(error = ?e, "App error");
            std::process::exit(1);
        }
    });
}
