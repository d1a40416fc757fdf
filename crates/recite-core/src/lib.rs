//! Recite Core Library
//!
//! Capture, transcribe, and record a spoken take: microphone frames fan
//! out to a WAV file and a pluggable recognition backend while a
//! coordinator owns the shared lifecycle and publishes transcript state
//! to observers.
//!
//! # Example
//!
//! ```no_run
//! use recite_core::{
//!     AudioSource, CaptureCoordinator, CoreResult, ScriptStep, ScriptedRecognizer,
//!     SystemAuthorizer,
//! };
//!
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let backend = Arc::new(ScriptedRecognizer::new(
//!         vec![
//!             ScriptStep::Partial("hello".to_string()),
//!             ScriptStep::Final("hello world".to_string()),
//!         ],
//!         Duration::from_millis(300),
//!     ));
//!     let coordinator = CaptureCoordinator::new(
//!         Some(backend),
//!         Arc::new(SystemAuthorizer),
//!         AudioSource::Microphone { device: None },
//!     );
//!
//!     let mut snapshots = coordinator.snapshots();
//!     coordinator.begin_session(Path::new("take.wav")).await?;
//!
//!     while snapshots.changed().await.is_ok() {
//!         let snapshot = snapshots.borrow_and_update().clone();
//!         println!("{}", snapshot.transcript);
//!         if snapshot.ended.is_some() {
//!             break;
//!         }
//!     }
//!     coordinator.end_session().await;
//!     Ok(())
//! }
//! ```

mod access;
mod audio;
mod coordinator;
mod error;
mod recognition;

pub use {
    access::{AccessAuthorizer, SystemAuthorizer},
    audio::{AudioFrame, AudioSource, FrameFormat, MicSource, WavSink},
    coordinator::{CaptureCoordinator, CaptureSnapshot, EndCause},
    error::{CaptureError, RecognitionError, Result as CoreResult, SessionError, SinkError},
    recognition::{
        RecognitionBackend, RecognitionSession, RecognitionUpdate, ScriptStep, ScriptedRecognizer,
        TranscriptEvent,
    },
};

#[cfg(test)]
mod tests;
