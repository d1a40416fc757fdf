use crate::{RecordingHistoryEntry, TopicStore};

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

fn entry(transcript: &str) -> RecordingHistoryEntry {
    RecordingHistoryEntry {
        id: Uuid::new_v4(),
        recorded_at: Utc::now(),
        transcript: Some(transcript.to_string()),
        audio_path: None,
    }
}

/// WHAT: Loading from a missing file provides the sample topics
/// WHY: First launch must offer passages to practice without setup
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_loaded_then_samples_provided() {
    // Given: A path with no file behind it
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("topics.json");

    // When: Loading the store
    let store = TopicStore::load(&path);

    // Then: The samples are there and nothing was written yet
    let titles: Vec<&str> = store.topics().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["The Great Wall", "Canada Goose"]);
    assert!(!path.exists());
}

/// WHAT: Saving and reloading preserves topics and their history
/// WHY: Takes recorded in one run must survive into the next
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_store_when_reloaded_then_history_preserved() {
    // Given: A store with one banked take, under a directory that
    // does not exist yet
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("topics.json");
    let mut store = TopicStore::load(&path);
    let take = entry("the great wall of china");
    store.topics_mut()[0].record_take(take.clone());

    // When: Saving and loading it back
    store.save().unwrap();
    let reloaded = TopicStore::load(&path);

    // Then: The take and the topic roster survive
    assert!(path.exists());
    assert_eq!(reloaded.topics().len(), 2);
    assert_eq!(reloaded.topics()[0].history, vec![take]);
    assert!(reloaded.topics()[1].history.is_empty());
}

/// WHAT: An unreadable file falls back to the sample topics
/// WHY: A corrupt file must not keep the app from starting
#[test]
#[allow(clippy::unwrap_used)]
fn given_corrupt_file_when_loaded_then_samples_provided() {
    // Given: A file that is not JSON
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("topics.json");
    std::fs::write(&path, "not json at all").unwrap();

    // When: Loading the store
    let store = TopicStore::load(&path);

    // Then: The samples stand in for the broken file
    assert_eq!(store.topics().len(), 2);
    assert_eq!(store.topics()[0].title, "The Great Wall");
}
