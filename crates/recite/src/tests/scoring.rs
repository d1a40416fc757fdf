use crate::PronunciationFeedback;
use crate::scoring::{ScoreRequest, ScoredFragment};

/// WHAT: Folding fragments yields their mean as the average score
/// WHY: The summary number the user sees must match the fragments
#[test]
fn given_fragments_when_folded_then_average_is_mean() {
    // Given: Two fragments with known scores
    let fragments = vec![
        ScoredFragment {
            original: "The Great".to_string(),
            recognized: "the great".to_string(),
            score: 0.9,
        },
        ScoredFragment {
            original: "Wall".to_string(),
            recognized: "wall".to_string(),
            score: 0.7,
        },
    ];

    // When: Folding them into feedback
    let feedback = PronunciationFeedback::from_fragments(fragments);

    // Then: The average is the mean and the fragments stay in order
    assert!((feedback.average_score - 0.8).abs() < 1e-6);
    assert_eq!(feedback.fragments.len(), 2);
    assert_eq!(feedback.fragments[0].original, "The Great");
}

/// WHAT: Folding no fragments yields a zero average
/// WHY: A take the service could not split must not divide by zero
#[test]
fn given_no_fragments_when_folded_then_average_is_zero() {
    let feedback = PronunciationFeedback::from_fragments(Vec::new());

    assert!(feedback.fragments.is_empty());
    assert!(feedback.average_score.abs() < f32::EPSILON);
}

/// WHAT: The request body uses the service's camelCase field names
/// WHY: The scoring service rejects snake_case payloads
#[test]
#[allow(clippy::unwrap_used)]
fn given_request_when_serialized_then_fields_are_camel_case() {
    // Given: A request borrowing both texts
    let request = ScoreRequest {
        original_text: "The Great Wall",
        recognized_text: "the great wall",
    };

    // When: Serializing it
    let value = serde_json::to_value(&request).unwrap();

    // Then: The wire names are camelCase
    assert_eq!(value["originalText"], "The Great Wall");
    assert_eq!(value["recognizedText"], "the great wall");
}

/// WHAT: A service response parses into scored fragments
/// WHY: The response shape is the contract with the scoring service
#[test]
#[allow(clippy::unwrap_used)]
fn given_service_payload_when_parsed_then_fragments_deserialize() {
    // Given: A response as the service sends it
    let payload = r#"[
        {"original": "The Great", "recognized": "the great", "score": 0.92},
        {"original": "Wall", "recognized": "wall", "score": 0.88}
    ]"#;

    // When: Parsing it
    let fragments: Vec<ScoredFragment> = serde_json::from_str(payload).unwrap();

    // Then: Both fragments arrive with their scores
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].recognized, "the great");
    assert!((fragments[1].score - 0.88).abs() < 1e-6);
}
