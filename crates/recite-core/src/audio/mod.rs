mod frame;
mod sink;
pub(crate) mod source;

pub use {
    frame::{AudioFrame, FrameFormat},
    sink::WavSink,
    source::{AudioSource, MicSource},
};
