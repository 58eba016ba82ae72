//! Autosave reconciler: keeps the edit state, the local cache and the remote
//! record eventually consistent.
//!
//! Flow: wait for profile sync → load-then-merge the remote record once →
//!       debounce edits → spawn a save for the last edit of each burst.
//!
//! Saves run as independent tasks. A second save may start before the first
//! resolves; whichever lands last wins on the remote side.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::cache::LocalCache;
use crate::editor::SharedDocument;
use crate::models::resume::{PersistedContent, StoredContent};
use crate::remote::ResumeStore;
use crate::sync::debounce::Debouncer;
use crate::sync::status::StatusTracker;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);
pub const DEFAULT_STATUS_RESET: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy)]
pub struct AutosaveSettings {
    /// Quiet period after the last edit before a save is issued.
    pub debounce: Duration,
    /// How long `saved`/`error` stays visible before returning to `idle`.
    pub status_reset: Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            status_reset: DEFAULT_STATUS_RESET,
        }
    }
}

/// Title written with every autosave, e.g. `Resume - 3/7/2025`.
pub fn save_title(date: NaiveDate) -> String {
    format!("Resume - {}", date.format("%-m/%-d/%Y"))
}

/// Outcome of the initial remote load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Adopted,
    AdoptedLegacy,
    NoRemote,
    Failed,
}

pub struct Reconciler {
    document: SharedDocument,
    store: Arc<dyn ResumeStore>,
    cache: LocalCache,
    status: StatusTracker,
}

impl Reconciler {
    pub fn new(
        document: SharedDocument,
        store: Arc<dyn ResumeStore>,
        cache: LocalCache,
        status: StatusTracker,
    ) -> Self {
        Self {
            document,
            store,
            cache,
            status,
        }
    }

    /// Drives the reconciler until the edit channel closes. Returns early,
    /// without loading or saving, if profile sync never completes.
    pub async fn run(self, mut profile_synced: watch::Receiver<bool>, mut debouncer: Debouncer) {
        if profile_synced.wait_for(|synced| *synced).await.is_err() {
            warn!("Profile sync did not complete; autosave disabled for this session");
            return;
        }

        let outcome = self.load_remote(&mut debouncer).await;
        debug!("Initial load finished: {outcome:?}");

        while let Some(revision) = debouncer.settled().await {
            let content = self.document.read().await.content();
            debug!("Edits settled at revision {revision}; scheduling save");
            self.spawn_save(content);
        }
        debug!("Edit channel closed; reconciler stopped");
    }

    /// Fetches the user's first resume and adopts it into the edit state and
    /// the local cache. Keeps local state when there is nothing to adopt.
    ///
    /// Adoption, the cache write and acknowledging pending revisions happen
    /// under one write guard. Edits that landed earlier are superseded; edits
    /// that land afterwards are debounced and saved as usual.
    pub async fn load_remote(&self, debouncer: &mut Debouncer) -> LoadOutcome {
        let records = match self.store.get_resumes().await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to load resume: {e}");
                warn!("Any existing remote resume will be overwritten by the next save");
                return LoadOutcome::Failed;
            }
        };

        let Some(record) = records.into_iter().next().filter(|r| !r.content.is_null()) else {
            info!("No remote resume found; keeping local state");
            return LoadOutcome::NoRemote;
        };

        let stored = match StoredContent::from_value(&record.content) {
            Ok(stored) => stored,
            Err(e) => {
                error!("Remote resume {} has unreadable content: {e}", record.id);
                warn!("Remote resume {} will be overwritten by the next save", record.id);
                return LoadOutcome::Failed;
            }
        };
        let outcome = if stored.is_legacy() {
            info!("Remote resume {} uses the legacy shape; applying default theme", record.id);
            LoadOutcome::AdoptedLegacy
        } else {
            LoadOutcome::Adopted
        };

        let content = stored.into_current();
        let mut document = self.document.write().await;
        document.adopt(content.clone());
        if let Err(e) = self.cache.store(&content).await {
            warn!("Failed to write local cache after remote load: {e}");
        }
        debouncer.mark_seen();
        drop(document);

        info!("Adopted remote resume {}", record.id);
        outcome
    }

    fn spawn_save(&self, content: PersistedContent) {
        let store = Arc::clone(&self.store);
        let status = self.status.clone();
        tokio::spawn(async move {
            save_once(store.as_ref(), &status, &content).await;
        });
    }
}

/// Pushes `content` to the store, driving the save status. Failures are
/// logged and reflected only in the status; nothing is retried.
pub async fn save_once(
    store: &dyn ResumeStore,
    status: &StatusTracker,
    content: &PersistedContent,
) -> bool {
    let ticket = status.begin();
    let title = save_title(Local::now().date_naive());
    match store.save_resume(content, &title).await {
        Ok(record) => {
            info!("Auto-saved resume {}", record.id);
            status.finish(ticket, true);
            true
        }
        Err(e) => {
            error!("Auto-save failed: {e}");
            status.finish(ticket, false);
            false
        }
    }
}
