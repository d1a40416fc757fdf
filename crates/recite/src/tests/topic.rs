use crate::topic::Theme;
use crate::{PracticeTopic, RecordingHistoryEntry};

use chrono::Utc;
use uuid::Uuid;

fn entry(transcript: &str) -> RecordingHistoryEntry {
    RecordingHistoryEntry {
        id: Uuid::new_v4(),
        recorded_at: Utc::now(),
        transcript: Some(transcript.to_string()),
        audio_path: None,
    }
}

/// WHAT: The sample topics ship two distinct three minute passages
/// WHY: First launch must offer ready material with no history yet
#[test]
fn given_fresh_install_when_samples_built_then_two_passages_ready() {
    // When: Building the samples
    let topics = PracticeTopic::sample_topics();

    // Then: Two distinct passages, three minutes each, no takes yet
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].title, "The Great Wall");
    assert_eq!(topics[1].title, "Canada Goose");
    assert!(topics[0].passage.contains("Great Wall of China"));
    assert!(topics[1].passage.contains("Canada goose"));
    assert_ne!(topics[0].passage, topics[1].passage);
    for topic in &topics {
        assert_eq!(topic.length_minutes, 3);
        assert!(topic.history.is_empty());
        assert!(topic.model_audio.is_none());
    }
    assert_eq!(topics[0].theme, Theme::Orange);
    assert_eq!(topics[1].theme, Theme::Poppy);
    assert_ne!(topics[0].id, topics[1].id);
}

/// WHAT: New takes land at the front of a topic's history
/// WHY: The history listing shows the most recent take first
#[test]
fn given_topic_with_takes_when_take_recorded_then_newest_first() {
    // Given: A topic with one banked take
    let mut topics = PracticeTopic::sample_topics();
    let first = entry("first take");
    let second = entry("second take");
    topics[0].record_take(first.clone());

    // When: Recording another take
    topics[0].record_take(second.clone());

    // Then: The newest take leads the history
    assert_eq!(topics[0].history, vec![second, first]);
}

/// WHAT: Themes serialize as lowercase names
/// WHY: The topic file stores themes by name, not by index
#[test]
#[allow(clippy::unwrap_used)]
fn given_theme_when_serialized_then_name_is_lowercase() {
    let value = serde_json::to_value(Theme::Seafoam).unwrap();
    assert_eq!(value, "seafoam");

    let parsed: Theme = serde_json::from_str("\"poppy\"").unwrap();
    assert_eq!(parsed, Theme::Poppy);

    assert_eq!(Theme::Oxblood.to_string(), "oxblood");
}
