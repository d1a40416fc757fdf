use crate::{
    RecognitionError, RecognitionSession, RecognitionUpdate, ScriptStep, ScriptedRecognizer,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

const PACING: Duration = Duration::from_millis(10);

async fn next_update(
    updates: &mut mpsc::UnboundedReceiver<RecognitionUpdate>,
) -> Option<RecognitionUpdate> {
    timeout(Duration::from_secs(5), updates.recv())
        .await
        .ok()
        .flatten()
}

/// WHAT: Scripted hypotheses arrive in order with exactly one final
/// WHY: Observers rely on ordered events and a single terminal item
#[tokio::test]
async fn given_scripted_backend_when_run_then_ordered_events_single_final() {
    // Given: Two partials followed by a final
    let backend = Arc::new(ScriptedRecognizer::new(
        vec![
            ScriptStep::Partial("The".to_string()),
            ScriptStep::Partial("The Great".to_string()),
            ScriptStep::Final("The Great Wall".to_string()),
        ],
        PACING,
    ));

    // When: Running a session to completion
    let (mut session, _audio, mut updates) = RecognitionSession::start(backend);
    let mut texts = Vec::new();
    let mut finals = 0;
    let mut failed = false;
    while let Some(update) = next_update(&mut updates).await {
        match update {
            RecognitionUpdate::Transcript(event) => {
                if event.is_final {
                    finals += 1;
                }
                texts.push(event.text);
            }
            RecognitionUpdate::Failed(_) => failed = true,
        }
    }

    // Then: Events arrived in script order, ending at the final
    assert_eq!(texts, vec!["The", "The Great", "The Great Wall"]);
    assert_eq!(finals, 1);
    assert!(!failed);
    session.cancel().await;
}

/// WHAT: A scripted failure yields exactly one Failed update
/// WHY: Failures are terminal and surfaced once, never retried
#[tokio::test]
async fn given_failing_backend_when_run_then_single_failed_update() {
    // Given: A partial followed by a failure
    let backend = Arc::new(ScriptedRecognizer::new(
        vec![
            ScriptStep::Partial("The Great".to_string()),
            ScriptStep::Fail,
        ],
        PACING,
    ));

    // When: Draining the session
    let (mut session, _audio, mut updates) = RecognitionSession::start(backend);
    let mut texts = Vec::new();
    let mut failures = Vec::new();
    while let Some(update) = next_update(&mut updates).await {
        match update {
            RecognitionUpdate::Transcript(event) => texts.push(event.text),
            RecognitionUpdate::Failed(e) => failures.push(e),
        }
    }

    // Then: The partial preceded a single terminal failure
    assert_eq!(texts, vec!["The Great"]);
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        RecognitionError::RecognizerUnavailable { .. }
    ));
    assert_eq!(failures[0].user_message(), "Recognizer is unavailable");
    session.cancel().await;
}

/// WHAT: No update is delivered after cancel returns
/// WHY: Teardown must not race a late hypothesis into observers
#[tokio::test]
async fn given_running_session_when_cancelled_then_no_further_updates() {
    // Given: A long script that would keep emitting for a while
    let backend = Arc::new(ScriptedRecognizer::new(
        (0..50)
            .map(|i| ScriptStep::Partial(format!("hypothesis {}", i)))
            .collect(),
        Duration::from_millis(20),
    ));
    let (mut session, _audio, mut updates) = RecognitionSession::start(backend);

    // When: Waiting for the first hypothesis, then cancelling twice
    let first = next_update(&mut updates).await;
    assert!(first.is_some());
    session.cancel().await;
    session.cancel().await;

    // Then: The stream drains to a close with nothing arriving late
    while updates.try_recv().is_ok() {}
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(updates.try_recv().is_err());
}

/// WHAT: A replaced script plays in the next session
/// WHY: One recognizer instance serves many takes in a row
#[tokio::test]
async fn given_replaced_script_when_next_session_runs_then_new_script_plays() {
    // Given: A recognizer whose script is swapped before the session
    let backend = Arc::new(ScriptedRecognizer::new(
        vec![ScriptStep::Final("old".to_string())],
        PACING,
    ));
    backend.set_script(vec![ScriptStep::Final("new".to_string())]);

    // When: Running a session
    let (mut session, _audio, mut updates) = RecognitionSession::start(backend);
    let update = next_update(&mut updates).await;

    // Then: The replacement script is the one that plays
    let final_text = match update {
        Some(RecognitionUpdate::Transcript(event)) if event.is_final => event.text,
        _ => String::new(),
    };
    assert_eq!(final_text, "new");
    session.cancel().await;
}
