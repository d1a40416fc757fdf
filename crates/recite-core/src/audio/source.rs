use crate::{AudioFrame, CaptureError, FrameFormat};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Where a session's frames come from.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Live microphone input.
    Microphone {
        /// Input device name; `None` selects the system default.
        device: Option<String>,
    },

    /// Generated frames at a fixed cadence. Lets the whole pipeline run
    /// on machines with no input hardware.
    Synthetic {
        /// Format of the generated frames.
        format: FrameFormat,
        /// Samples per generated frame.
        frame_len: usize,
        /// Delay between frames.
        cadence: Duration,
    },
}

impl AudioSource {
    pub(crate) fn driver(&self) -> Result<Box<dyn CaptureDriver>, CaptureError> {
        match self {
            AudioSource::Microphone { device } => Ok(Box::new(MicSource::new(device.as_deref())?)),
            AudioSource::Synthetic {
                format,
                frame_len,
                cadence,
            } => Ok(Box::new(SyntheticSource::new(*format, *frame_len, *cadence))),
        }
    }
}

/// Uniform start/stop surface over the capture implementations.
pub(crate) trait CaptureDriver: Send {
    /// Format of the frames this driver delivers.
    fn format(&self) -> FrameFormat;

    /// Begin delivering frames to `on_frame` off the caller's thread.
    fn start(&mut self, on_frame: Box<dyn FnMut(AudioFrame) + Send>) -> Result<(), CaptureError>;

    /// Detach. No `on_frame` call is in flight once this returns.
    fn stop(&mut self);
}

/// Microphone capture through the system's default audio host.
pub struct MicSource {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    /// Signals the audio callback to stop delivering frames. Set to
    /// `true` before dropping the stream so no callback runs after
    /// `stop()` returns.
    shutdown: Arc<AtomicBool>,
}

impl MicSource {
    /// Open the named input device, or the system default for `None`.
    #[track_caller]
    #[instrument]
    pub fn new(device: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = match device {
            Some(name) => host
                .input_devices()
                .map_err(|e| CaptureError::DeviceUnavailable {
                    reason: format!("Failed to enumerate input devices: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
                .find(|d| d.name().is_ok_and(|n| n == name))
                .ok_or_else(|| CaptureError::DeviceUnavailable {
                    reason: format!("Input device not found: {}", name),
                    location: ErrorLocation::from(Location::caller()),
                })?,
            None => host
                .default_input_device()
                .ok_or(CaptureError::DeviceUnavailable {
                    reason: "No default input device".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: format!("Failed to get device config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "Input device opened"
        );

        Ok(Self {
            device,
            config: config.into(),
            stream: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Format frames will be delivered in.
    pub fn format(&self) -> FrameFormat {
        FrameFormat {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
        }
    }

    /// Start capture, delivering each hardware buffer to `on_frame` on
    /// the audio thread in capture order.
    #[track_caller]
    #[instrument(skip(self, on_frame))]
    pub fn start(
        &mut self,
        mut on_frame: impl FnMut(AudioFrame) + Send + 'static,
    ) -> Result<(), CaptureError> {
        let shutdown = Arc::clone(&self.shutdown);
        let format = self.format();

        // Reset shutdown flag for the new session
        self.shutdown.store(false, Ordering::Release);

        let mut samples_seen: u64 = 0;

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Check the shutdown flag first: once stop() sets it,
                    // a late callback must not deliver another frame.
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }

                    let elapsed = elapsed_for(samples_seen, format);
                    samples_seen += data.len() as u64;

                    on_frame(AudioFrame {
                        samples: data.iter().map(|&s| sample_to_i16(s)).collect(),
                        elapsed,
                        format,
                    });
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: format!("Failed to build input stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| CaptureError::DeviceUnavailable {
            reason: format!("Failed to start input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        info!("Microphone capture started");

        Ok(())
    }

    /// Detach capture. Idempotent; once this returns no callback
    /// invocation is in flight.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        // Signal the callback before dropping the stream so a late
        // callback observes the flag instead of delivering a frame.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);

            // Brief settle so any in-flight callback completes before we
            // report the source stopped. Most backends join the audio
            // thread in drop, but not all of them guarantee it.
            thread::sleep(Duration::from_millis(5));

            info!("Microphone capture stopped");
        }
    }
}

impl CaptureDriver for MicSource {
    fn format(&self) -> FrameFormat {
        MicSource::format(self)
    }

    fn start(&mut self, on_frame: Box<dyn FnMut(AudioFrame) + Send>) -> Result<(), CaptureError> {
        MicSource::start(self, on_frame)
    }

    fn stop(&mut self) {
        MicSource::stop(self);
    }
}

/// Deterministic frame generator used where no capture hardware exists.
///
/// Frame `n` is filled with the sample value `n` (wrapping), which makes
/// delivery order observable downstream.
pub(crate) struct SyntheticSource {
    format: FrameFormat,
    frame_len: usize,
    cadence: Duration,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl SyntheticSource {
    pub(crate) fn new(format: FrameFormat, frame_len: usize, cadence: Duration) -> Self {
        Self {
            format,
            frame_len,
            cadence,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl CaptureDriver for SyntheticSource {
    fn format(&self) -> FrameFormat {
        self.format
    }

    fn start(
        &mut self,
        mut on_frame: Box<dyn FnMut(AudioFrame) + Send>,
    ) -> Result<(), CaptureError> {
        self.shutdown.store(false, Ordering::Release);

        let shutdown = Arc::clone(&self.shutdown);
        let format = self.format;
        let frame_len = self.frame_len;
        let cadence = self.cadence;

        self.worker = Some(thread::spawn(move || {
            let mut frame_index: u64 = 0;
            while !shutdown.load(Ordering::Acquire) {
                let fill = frame_index as i16;
                on_frame(AudioFrame {
                    samples: std::iter::repeat(fill).take(frame_len).collect(),
                    elapsed: elapsed_for(frame_index * frame_len as u64, format),
                    format,
                });
                frame_index += 1;
                thread::sleep(cadence);
            }
        }));

        debug!(?format, frame_len, "Synthetic capture started");
        Ok(())
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        if let Some(worker) = self.worker.take() {
            // Joining guarantees no delivery is in flight once stop returns.
            if worker.join().is_err() {
                error!("Synthetic capture thread panicked");
            }
            debug!("Synthetic capture stopped");
        }
    }
}

/// Clamp a float sample into 16-bit PCM range.
pub(crate) fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

fn elapsed_for(samples_seen: u64, format: FrameFormat) -> Duration {
    let per_second = u64::from(format.sample_rate) * u64::from(format.channels);
    if per_second == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(samples_seen.saturating_mul(1_000_000) / per_second)
}
