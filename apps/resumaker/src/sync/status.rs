//! Save-status tracking: `idle → saving → {saved | error} → idle`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Shared status cell. Each save takes a ticket; only the holder of the
/// newest ticket may settle or reset the status, so a slow earlier save never
/// overwrites the outcome of a later one.
#[derive(Clone)]
pub struct StatusTracker {
    tx: Arc<watch::Sender<SaveStatus>>,
    latest: Arc<AtomicU64>,
    reset_after: Duration,
}

impl StatusTracker {
    pub fn new(reset_after: Duration) -> Self {
        let (tx, _) = watch::channel(SaveStatus::Idle);
        Self {
            tx: Arc::new(tx),
            latest: Arc::new(AtomicU64::new(0)),
            reset_after,
        }
    }

    pub fn current(&self) -> SaveStatus {
        *self.tx.borrow()
    }

    /// Enters `saving` and returns the ticket for this save.
    pub fn begin(&self) -> u64 {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(SaveStatus::Saving);
        ticket
    }

    /// Settles a save as `saved` or `error`, then schedules the reset to `idle`.
    pub fn finish(&self, ticket: u64, succeeded: bool) {
        if self.latest.load(Ordering::SeqCst) != ticket {
            return;
        }
        let outcome = if succeeded {
            SaveStatus::Saved
        } else {
            SaveStatus::Error
        };
        self.tx.send_replace(outcome);

        let tracker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tracker.reset_after).await;
            if tracker.latest.load(Ordering::SeqCst) == ticket {
                tracker.tx.send_replace(SaveStatus::Idle);
            }
        });
    }
}
