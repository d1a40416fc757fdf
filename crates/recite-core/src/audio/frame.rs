use std::{sync::Arc, time::Duration};

/// PCM format shared by every frame of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Samples per second, per channel.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// One immutable buffer of interleaved 16-bit PCM samples.
///
/// Produced by a capture source and fanned out to the file sink and the
/// recognition backend. The sample buffer is reference counted so the
/// fan-out clones are cheap; it is never mutated after capture.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Interleaved samples.
    pub samples: Arc<[i16]>,
    /// Time since the session's first sample.
    pub elapsed: Duration,
    /// Sample rate and channel count of `samples`.
    pub format: FrameFormat,
}
