use crate::{AudioFrame, FrameFormat, SinkError, WavSink};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

const FORMAT: FrameFormat = FrameFormat {
    sample_rate: 16_000,
    channels: 1,
};

fn frame(samples: Vec<i16>) -> AudioFrame {
    AudioFrame {
        samples: Arc::from(samples),
        elapsed: Duration::ZERO,
        format: FORMAT,
    }
}

/// WHAT: Samples land in the file in write order
/// WHY: The recording must replay exactly what the source delivered
#[test]
#[allow(clippy::unwrap_used)]
fn given_frames_written_in_order_when_reading_back_then_samples_in_same_order() {
    // Given: A sink and three distinguishable frames
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("take.wav");
    let mut sink = WavSink::create(&path, FORMAT).unwrap();

    // When: Writing the frames in order and finalizing
    sink.write(&frame(vec![1, 2, 3])).unwrap();
    sink.write(&frame(vec![4, 5])).unwrap();
    sink.write(&frame(vec![6, 7, 8, 9])).unwrap();
    sink.finish().unwrap();

    // Then: The file holds the concatenation in the same order
    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.channels, 1);
}

/// WHAT: Creating a sink under a missing directory fails with OpenFailed
/// WHY: Callers distinguish unopenable destinations from later write errors
#[test]
fn given_missing_directory_when_creating_sink_then_open_failed() {
    let result = WavSink::create(Path::new("/nonexistent-recordings-dir/take.wav"), FORMAT);

    assert!(matches!(result, Err(SinkError::OpenFailed { .. })));
}

/// WHAT: finish is idempotent and later writes are ignored
/// WHY: Teardown paths may close the sink more than once
#[test]
#[allow(clippy::unwrap_used)]
fn given_finished_sink_when_finishing_again_then_ok() {
    // Given: A sink with one frame written and finalized
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("take.wav");
    let mut sink = WavSink::create(&path, FORMAT).unwrap();
    sink.write(&frame(vec![1, 2])).unwrap();
    sink.finish().unwrap();

    // When: Finishing again and writing after the close
    let second_finish = sink.finish();
    let late_write = sink.write(&frame(vec![3, 4]));

    // Then: Both are accepted as no-ops and the file is unchanged
    assert!(second_finish.is_ok());
    assert!(late_write.is_ok());
    let mut reader = hound::WavReader::open(&path).unwrap();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, 2]);
}

/// WHAT: Dropping an unfinished sink still produces a readable file
/// WHY: Abnormal teardown must leave a valid partial artifact behind
#[test]
#[allow(clippy::unwrap_used)]
fn given_unfinished_sink_when_dropped_then_file_readable() {
    // Given: A sink with samples written but never finalized
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("take.wav");
    let mut sink = WavSink::create(&path, FORMAT).unwrap();
    sink.write(&frame(vec![7, 8, 9])).unwrap();

    // When: Dropping the sink without calling finish
    drop(sink);

    // Then: The header was finalized and the samples survive
    let mut reader = hound::WavReader::open(&path).unwrap();
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![7, 8, 9]);
}
