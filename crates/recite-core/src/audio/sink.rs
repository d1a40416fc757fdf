use crate::{AudioFrame, FrameFormat, SinkError};

use std::{
    fs::File,
    io::BufWriter,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, error, info, instrument};

/// Appends capture frames to a WAV file in arrival order.
///
/// Losing the file is recoverable while losing live transcription is
/// not, so writes are best effort from the pipeline's point of view:
/// the owner logs failures and keeps the session alive.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
    samples_written: u64,
}

impl WavSink {
    /// Create the output file and write its header.
    #[track_caller]
    #[instrument]
    pub fn create(path: &Path, format: FrameFormat) -> Result<Self, SinkError> {
        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let writer = WavWriter::create(path, spec).map_err(|e| SinkError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            path = ?path,
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Recording file created"
        );

        Ok(Self {
            writer: Some(writer),
            path: path.to_path_buf(),
            samples_written: 0,
        })
    }

    /// Append one frame. Frames must arrive in capture order; samples
    /// land in the file in exactly that order. A closed sink ignores
    /// further writes.
    #[track_caller]
    pub fn write(&mut self, frame: &AudioFrame) -> Result<(), SinkError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };

        for &sample in frame.samples.iter() {
            writer
                .write_sample(sample)
                .map_err(|e| SinkError::WriteFailed {
                    source: e,
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }
        self.samples_written += frame.samples.len() as u64;

        Ok(())
    }

    /// Finalize the header. Idempotent; also runs on drop if skipped.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| SinkError::WriteFailed {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

            info!(
                path = ?self.path,
                samples = self.samples_written,
                "Recording file finalized"
            );
        }
        Ok(())
    }

    /// Where this sink writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                error!(path = ?self.path, error = %e, "Failed to finalize recording file");
            } else {
                debug!(path = ?self.path, "Recording file finalized on drop");
            }
        }
    }
}
