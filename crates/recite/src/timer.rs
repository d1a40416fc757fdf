//! Practice clock for the active take.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Elapsed and remaining time on the practice clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSnapshot {
    /// Whole seconds since the take started.
    pub seconds_elapsed: u64,
    /// Whole seconds left on the clock.
    pub seconds_remaining: u64,
    /// Length of the clock.
    pub total_seconds: u64,
}

/// Second-resolution countdown for a practice take.
///
/// The clock is advisory: it counts the practice length down but never
/// stops the take on its own.
pub struct PracticeTimer {
    snapshot_tx: Arc<watch::Sender<TimerSnapshot>>,
    ticker: Option<JoinHandle<()>>,
}

impl PracticeTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(TimerSnapshot::default());
        Self {
            snapshot_tx: Arc::new(snapshot_tx),
            ticker: None,
        }
    }

    /// Arm the clock for `total_seconds` and start ticking.
    pub fn start(&mut self, total_seconds: u64) {
        self.stop();
        self.snapshot_tx.send_replace(TimerSnapshot {
            seconds_elapsed: 0,
            seconds_remaining: total_seconds,
            total_seconds,
        });
        let snapshot_tx = Arc::clone(&self.snapshot_tx);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut done = false;
                snapshot_tx.send_modify(|snapshot| {
                    if snapshot.seconds_elapsed < snapshot.total_seconds {
                        snapshot.seconds_elapsed += 1;
                        snapshot.seconds_remaining =
                            snapshot.total_seconds - snapshot.seconds_elapsed;
                    }
                    done = snapshot.seconds_elapsed >= snapshot.total_seconds;
                });
                if done {
                    debug!("Practice clock ran out");
                    break;
                }
            }
        }));
    }

    /// Freeze the clock where it is.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Current clock reading.
    pub fn snapshot(&self) -> TimerSnapshot {
        *self.snapshot_tx.borrow()
    }

    /// Watch the clock tick.
    pub fn updates(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }
}

impl Default for PracticeTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PracticeTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
