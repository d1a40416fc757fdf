use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Microphone capture errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No usable audio input device.
    #[error("Audio input unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Microphone access was denied by the permission check.
    #[error("Microphone permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Recognition backend errors with source location tracking.
///
/// Every variant is terminal for the session it occurs in and is never
/// retried automatically; retrying means starting a new session.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// No recognition backend was configured.
    #[error("No recognition backend configured {location}")]
    RecognizerMissing {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Speech recognition has not been authorized.
    #[error("Speech recognition not authorized {location}")]
    NotAuthorized {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio recording has not been permitted.
    #[error("Audio recording not permitted {location}")]
    NotPermittedToRecord {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The backend cannot take a session right now.
    #[error("Recognizer unavailable {location}")]
    RecognizerUnavailable {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecognitionError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionError::RecognizerMissing { .. } => "Can't initialize speech recognizer",
            RecognitionError::NotAuthorized { .. } => "Not authorized to recognize speech",
            RecognitionError::NotPermittedToRecord { .. } => "Not permitted to record audio",
            RecognitionError::RecognizerUnavailable { .. } => "Recognizer is unavailable",
        }
    }
}

/// Audio file sink errors with source location tracking.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Could not create the output file.
    #[error("Failed to open {path:?}: {source} {location}")]
    OpenFailed {
        /// Path that could not be opened.
        path: std::path::PathBuf,
        /// Underlying encoder error.
        #[source]
        source: hound::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A sample write or header finalize failed.
    #[error("Failed to write audio: {source} {location}")]
    WriteFailed {
        /// Underlying encoder error.
        #[source]
        source: hound::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Capture session lifecycle errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A session is already active on this coordinator.
    #[error("A recording session is already active {location}")]
    AlreadyRecording {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Capture device failure.
    #[error("Capture error: {source} {location}")]
    Capture {
        /// The underlying capture error.
        #[source]
        source: CaptureError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recognition backend failure.
    #[error("Recognition error: {source} {location}")]
    Recognition {
        /// The underlying recognition error.
        #[source]
        source: RecognitionError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio sink failure.
    #[error("Sink error: {source} {location}")]
    Sink {
        /// The underlying sink error.
        #[source]
        source: SinkError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

// Manual From impls with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<CaptureError> for SessionError {
    #[track_caller]
    fn from(source: CaptureError) -> Self {
        SessionError::Capture {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<RecognitionError> for SessionError {
    #[track_caller]
    fn from(source: RecognitionError) -> Self {
        SessionError::Recognition {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SinkError> for SessionError {
    #[track_caller]
    fn from(source: SinkError) -> Self {
        SessionError::Sink {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`SessionError`].
pub type Result<T> = std::result::Result<T, SessionError>;
