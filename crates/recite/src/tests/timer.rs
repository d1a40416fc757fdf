use crate::PracticeTimer;

use std::time::Duration;

/// WHAT: The clock counts whole seconds while a take runs
/// WHY: The elapsed and remaining readings drive the timer display
#[tokio::test(start_paused = true)]
async fn given_armed_clock_when_time_passes_then_elapsed_counts_up() {
    // Given: A clock armed for three seconds
    let mut timer = PracticeTimer::new();
    timer.start(3);
    assert_eq!(timer.snapshot().seconds_elapsed, 0);
    assert_eq!(timer.snapshot().seconds_remaining, 3);

    // When: Two and a half seconds pass
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Then: Two whole seconds have been counted
    let snapshot = timer.snapshot();
    assert_eq!(snapshot.seconds_elapsed, 2);
    assert_eq!(snapshot.seconds_remaining, 1);
    assert_eq!(snapshot.total_seconds, 3);
}

/// WHAT: The clock caps at the practice length and stops counting
/// WHY: The clock is advisory; it must not overshoot or end the take
#[tokio::test(start_paused = true)]
async fn given_running_clock_when_length_reached_then_counting_caps() {
    // Given: A clock armed for three seconds
    let mut timer = PracticeTimer::new();
    timer.start(3);

    // When: Far more time than the practice length passes
    tokio::time::sleep(Duration::from_secs(10)).await;

    // Then: The reading is pinned at the full length
    let snapshot = timer.snapshot();
    assert_eq!(snapshot.seconds_elapsed, 3);
    assert_eq!(snapshot.seconds_remaining, 0);
}

/// WHAT: Stopping the clock freezes its reading
/// WHY: The banked take keeps the reading from the moment it ended
#[tokio::test(start_paused = true)]
async fn given_running_clock_when_stopped_then_reading_freezes() {
    // Given: A clock that has counted one second
    let mut timer = PracticeTimer::new();
    timer.start(60);
    tokio::time::sleep(Duration::from_millis(1500)).await;

    // When: Stopping it and letting more time pass
    timer.stop();
    let frozen = timer.snapshot();
    tokio::time::sleep(Duration::from_secs(5)).await;

    // Then: The reading has not moved
    assert_eq!(frozen.seconds_elapsed, 1);
    assert_eq!(timer.snapshot(), frozen);
}

/// WHAT: Restarting the clock resets it to the new length
/// WHY: A fresh take must not inherit the previous take's count
#[tokio::test(start_paused = true)]
async fn given_restarted_clock_when_new_length_set_then_count_resets() {
    // Given: A clock partway through a long take
    let mut timer = PracticeTimer::new();
    timer.start(60);
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(timer.snapshot().seconds_elapsed, 2);

    // When: Restarting it with a new length
    timer.start(10);

    // Then: The count starts over against the new length
    let snapshot = timer.snapshot();
    assert_eq!(snapshot.seconds_elapsed, 0);
    assert_eq!(snapshot.seconds_remaining, 10);
    assert_eq!(snapshot.total_seconds, 10);
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(timer.snapshot().seconds_elapsed, 1);
}

/// WHAT: Watchers see the armed snapshot and each tick
/// WHY: The display updates by watching, not by polling
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_watcher_when_clock_ticks_then_updates_arrive() {
    // Given: A watcher subscribed before the clock starts
    let mut timer = PracticeTimer::new();
    let mut updates = timer.updates();

    // When: Arming the clock
    timer.start(5);

    // Then: The armed snapshot and the first tick both arrive
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().total_seconds, 5);
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().seconds_elapsed, 1);
}
