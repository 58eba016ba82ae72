//! Trailing-edge debounce over a revision counter.

use std::time::Duration;

use tokio::sync::watch;

/// Waits for bursts of revisions to go quiet. Every new revision restarts the
/// timer; only the last one in a burst is reported.
pub struct Debouncer {
    changes: watch::Receiver<u64>,
    delay: Duration,
}

impl Debouncer {
    pub fn new(changes: watch::Receiver<u64>, delay: Duration) -> Self {
        Self { changes, delay }
    }

    /// Treats every revision seen so far as handled.
    pub fn mark_seen(&mut self) {
        self.changes.borrow_and_update();
    }

    /// Resolves with the latest revision once `delay` has passed without a
    /// new one. Returns `None` when the revision sender is gone.
    pub async fn settled(&mut self) -> Option<u64> {
        self.changes.changed().await.ok()?;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {
                    return Some(*self.changes.borrow_and_update());
                }
                changed = self.changes.changed() => {
                    changed.ok()?;
                }
            }
        }
    }
}
