//! Editor session: the per-sign-in application state.
//!
//! Created at sign-in, torn down at sign-out. Owns the edit state, the
//! revision channel the reconciler debounces on, and the background tasks
//! (profile sync and reconciler) that live as long as the session.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::LocalCache;
use crate::editor::state::EditState;
use crate::editor::SharedDocument;
use crate::identity::{IdentityError, IdentityProvider};
use crate::models::user::UserIdentity;
use crate::remote::ResumeStore;
use crate::sync::debounce::Debouncer;
use crate::sync::profile::sync_profile;
use crate::sync::{AutosaveSettings, Reconciler, SaveStatus, StatusTracker};

pub struct EditorSession {
    user: UserIdentity,
    document: SharedDocument,
    revision: watch::Sender<u64>,
    cache: LocalCache,
    status: StatusTracker,
    store: Arc<dyn ResumeStore>,
    profile_synced: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl EditorSession {
    /// Hydrates the edit state from the local cache (or identity-seeded
    /// defaults) and spawns profile sync and the reconciler.
    ///
    pub async fn start(
        identity: &dyn IdentityProvider,
        store: Arc<dyn ResumeStore>,
        cache: LocalCache,
        settings: AutosaveSettings,
    ) -> Result<Self, IdentityError> {
        let user = identity.current_user().ok_or(IdentityError::SignedOut)?;

        let state = EditState::hydrate(cache.load().await, Some(&user));
        let document: SharedDocument = Arc::new(RwLock::new(state));
        let (revision, changes) = watch::channel(0u64);
        let (synced_tx, profile_synced) = watch::channel(false);
        let status = StatusTracker::new(settings.status_reset);

        let profile_task = tokio::spawn(sync_profile(Arc::clone(&store), user.clone(), synced_tx));
        let reconciler = Reconciler::new(
            Arc::clone(&document),
            Arc::clone(&store),
            cache.clone(),
            status.clone(),
        );
        let reconcile_task = tokio::spawn(
            reconciler.run(profile_synced.clone(), Debouncer::new(changes, settings.debounce)),
        );

        info!("Editor session started for user {}", user.id);

        Ok(Self {
            user,
            document,
            revision,
            cache,
            status,
            store,
            profile_synced,
            tasks: vec![profile_task, reconcile_task],
        })
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn store(&self) -> &Arc<dyn ResumeStore> {
        &self.store
    }

    /// Applies a mutation to the edit state. When the persisted content
    /// changed, the local cache is rewritten and the reconciler is notified,
    /// both before the write guard is released. Never waits on the network.
    pub async fn edit<R>(&self, mutate: impl FnOnce(&mut EditState) -> R) -> R {
        let mut document = self.document.write().await;
        let before = document.content();
        let result = mutate(&mut document);
        let after = document.content();

        if before != after {
            if let Err(e) = self.cache.store(&after).await {
                warn!("Failed to save to local cache: {e}");
            }
            self.revision.send_modify(|rev| *rev += 1);
        }
        result
    }

    pub async fn snapshot(&self) -> EditState {
        self.document.read().await.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.status.current()
    }

    pub fn is_profile_synced(&self) -> bool {
        *self.profile_synced.borrow()
    }

    /// Stops profile sync and the reconciler. Saves already in flight finish
    /// on their own.
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        info!("Editor session ended for user {}", self.user.id);
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Holds the active session, if any, and starts or ends it on request.
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn ResumeStore>,
    cache: LocalCache,
    settings: AutosaveSettings,
    current: RwLock<Option<Arc<EditorSession>>>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn ResumeStore>,
        cache: LocalCache,
        settings: AutosaveSettings,
    ) -> Self {
        Self {
            identity,
            store,
            cache,
            settings,
            current: RwLock::new(None),
        }
    }

    /// Returns the active session, starting one if none is running.
    pub async fn start(&self) -> Result<Arc<EditorSession>, IdentityError> {
        let mut current = self.current.write().await;
        if let Some(session) = current.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(EditorSession::start(
            self.identity.as_ref(),
            Arc::clone(&self.store),
            self.cache.clone(),
            self.settings,
        )
        .await?);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Ends the active session. Returns `false` when there was none.
    pub async fn end(&self) -> bool {
        match self.current.write().await.take() {
            Some(session) => {
                session.shutdown();
                true
            }
            None => false,
        }
    }

    pub async fn current(&self) -> Option<Arc<EditorSession>> {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::sleep;

    use crate::identity::StaticIdentity;
    use crate::models::resume::{PersistedContent, ResumeData, ThemeType};
    use crate::remote::memory::{MemoryStore, TEST_USER_ID};

    fn test_user() -> UserIdentity {
        UserIdentity {
            id: TEST_USER_ID.to_string(),
            email: Some("grace@example.com".to_string()),
            first_name: Some("Grace".to_string()),
            last_name: Some("Hopper".to_string()),
        }
    }

    fn manager_with(store: Arc<MemoryStore>, dir: &tempfile::TempDir) -> SessionManager {
        manager_with_settings(store, dir, AutosaveSettings::default())
    }

    fn manager_with_settings(
        store: Arc<MemoryStore>,
        dir: &tempfile::TempDir,
        settings: AutosaveSettings,
    ) -> SessionManager {
        let identity = Arc::new(StaticIdentity::new(
            Some(test_user()),
            Some("token".to_string()),
        ));
        SessionManager::new(
            identity,
            store,
            LocalCache::new(dir.path()),
            settings,
        )
    }

    fn seed_remote(store: &MemoryStore, summary: &str) -> ResumeData {
        let mut remote = ResumeData::default();
        remote.summary = summary.to_string();
        store.seed(json!({ "resumeData": remote, "theme": ThemeType::default() }));
        remote
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_edit_saves_once_and_cycles_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_save_delay(Duration::from_millis(100)));
        let manager = manager_with(store.clone(), &dir);
        let session = manager.start().await.unwrap();

        session
            .edit(|s| s.set_summary("Experienced engineer".to_string()))
            .await;
        assert_eq!(session.save_status(), SaveStatus::Idle);

        sleep(Duration::from_millis(1999)).await;
        assert!(store.saves().is_empty());
        assert_eq!(session.save_status(), SaveStatus::Idle);

        sleep(Duration::from_millis(51)).await;
        assert_eq!(session.save_status(), SaveStatus::Saving);

        sleep(Duration::from_millis(450)).await;
        assert_eq!(session.save_status(), SaveStatus::Saved);
        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].resume_data.summary, "Experienced engineer");

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(session.save_status(), SaveStatus::Idle);
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_coalesces_into_last_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session.edit(|s| s.set_skills(vec!["A".to_string()])).await;
        sleep(Duration::from_millis(500)).await;
        session
            .edit(|s| s.set_skills(vec!["A".to_string(), "B".to_string()]))
            .await;

        sleep(Duration::from_millis(5000)).await;
        let saves = store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].resume_data.skills, vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_save_sets_error_then_idle_and_keeps_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_saves(true);
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session.edit(|s| s.set_summary("Unsaved work".to_string())).await;

        sleep(Duration::from_millis(2001)).await;
        assert_eq!(session.save_status(), SaveStatus::Error);
        assert_eq!(store.saves().len(), 1);

        sleep(Duration::from_millis(2000)).await;
        assert_eq!(session.save_status(), SaveStatus::Idle);
        assert_eq!(session.snapshot().await.resume_data.summary, "Unsaved work");
        assert_eq!(store.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_edit_after_failure_retries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_saves(true);
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session.edit(|s| s.set_summary("first".to_string())).await;
        sleep(Duration::from_millis(2500)).await;
        store.fail_saves(false);

        session.edit(|s| s.set_summary("second".to_string())).await;
        sleep(Duration::from_millis(2500)).await;

        assert_eq!(session.save_status(), SaveStatus::Saved);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].content["resumeData"]["summary"], "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_state_survives_when_no_remote_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut cached = PersistedContent::default();
        cached.resume_data.summary = "From cache".to_string();
        LocalCache::new(dir.path()).store(&cached).await.unwrap();

        let store = Arc::new(MemoryStore::new());
        let session = manager_with(store.clone(), &dir).start().await.unwrap();
        sleep(Duration::from_millis(10)).await;

        assert!(session.is_profile_synced());
        assert_eq!(session.snapshot().await.content(), cached);
        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_cache_falls_back_to_identity_seeded_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path());
        std::fs::write(cache.path(), "{\"resumeData\": [oops").unwrap();

        let store = Arc::new(MemoryStore::new());
        let session = manager_with(store, &dir).start().await.unwrap();

        let state = session.snapshot().await;
        assert_eq!(state.resume_data.personal_info.name, "Grace Hopper");
        assert_eq!(state.resume_data.personal_info.email, "grace@example.com");
        assert_eq!(state.theme, ThemeType::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_record_replaces_cached_state_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let mut cached = PersistedContent::default();
        cached.resume_data.summary = "Stale cache".to_string();
        LocalCache::new(dir.path()).store(&cached).await.unwrap();

        let store = Arc::new(MemoryStore::new());
        let mut remote = ResumeData::default();
        remote.summary = "Remote wins".to_string();
        store.seed(json!({ "resumeData": remote, "theme": ThemeType::default() }));

        let session = manager_with(store.clone(), &dir).start().await.unwrap();
        sleep(Duration::from_millis(5000)).await;

        assert_eq!(session.snapshot().await.resume_data.summary, "Remote wins");
        let recached = LocalCache::new(dir.path()).load().await.unwrap();
        assert_eq!(recached.resume_data.unwrap().summary, "Remote wins");
        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_pending_load_is_superseded_by_remote() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_next_profile_syncs(1);
        let remote = seed_remote(&store, "Remote wins");
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session.edit(|s| s.set_summary("Typed early".to_string())).await;
        assert!(!session.is_profile_synced());
        let cached = LocalCache::new(dir.path()).load().await.unwrap();
        assert_eq!(cached.resume_data.unwrap().summary, "Typed early");

        sleep(Duration::from_millis(5000)).await;

        assert!(session.is_profile_synced());
        let state = session.snapshot().await;
        assert_eq!(state.resume_data, remote);
        assert_eq!(state.theme, ThemeType::default());
        let cached = LocalCache::new(dir.path()).load().await.unwrap();
        assert_eq!(cached.resume_data.unwrap(), remote);
        assert!(store.saves().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_edit_racing_remote_load_is_either_superseded_or_saved() {
        let settings = AutosaveSettings {
            debounce: Duration::from_millis(10),
            status_reset: Duration::from_millis(10),
        };
        for _ in 0..50 {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(MemoryStore::new());
            let remote = seed_remote(&store, "Remote");
            let session = manager_with_settings(store.clone(), &dir, settings)
                .start()
                .await
                .unwrap();

            tokio::task::yield_now().await;
            session.edit(|s| s.set_summary("Edit".to_string())).await;
            sleep(Duration::from_millis(150)).await;

            let state = session.snapshot().await;
            let cached = LocalCache::new(dir.path()).load().await.unwrap();
            assert_eq!(cached.resume_data.unwrap(), state.resume_data);

            if state.resume_data.summary == "Edit" {
                let saves = store.saves();
                assert_eq!(saves.last().unwrap().resume_data.summary, "Edit");
            } else {
                assert_eq!(state.resume_data, remote);
                assert!(store.saves().is_empty());
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_write_local_cache_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let session = manager_with(store, &dir).start().await.unwrap();

        session.edit(|s| s.set_summary("Cached now".to_string())).await;

        let cached = LocalCache::new(dir.path()).load().await.unwrap();
        assert_eq!(cached.resume_data.unwrap().summary, "Cached now");
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_toggle_does_not_autosave() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session
            .edit(|s| s.apply_visibility(&HashMap::from([("phone".to_string(), false)])))
            .await
            .unwrap();
        sleep(Duration::from_millis(5000)).await;

        assert!(!session.snapshot().await.section_visibility.phone);
        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_saves_when_profile_sync_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_next_profile_syncs(10);
        let session = manager_with(store.clone(), &dir).start().await.unwrap();

        session.edit(|s| s.set_summary("Never saved".to_string())).await;
        sleep(Duration::from_secs(30)).await;

        assert!(!session.is_profile_synced());
        assert!(store.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_session_stops_autosave() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let manager = manager_with(store.clone(), &dir);
        let session = manager.start().await.unwrap();
        sleep(Duration::from_millis(10)).await;

        session.edit(|s| s.set_summary("After sign-out".to_string())).await;
        assert!(manager.end().await);
        assert!(manager.current().await.is_none());

        sleep(Duration::from_millis(5000)).await;
        assert!(store.saves().is_empty());
        assert!(!manager.end().await);
    }

    #[tokio::test]
    async fn test_start_without_user_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SessionManager::new(
            Arc::new(StaticIdentity::new(None, None)),
            Arc::new(MemoryStore::new()),
            LocalCache::new(dir.path()),
            AutosaveSettings::default(),
        );
        assert!(matches!(manager.start().await, Err(IdentityError::SignedOut)));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with(Arc::new(MemoryStore::new()), &dir);
        let first = manager.start().await.unwrap();
        let second = manager.start().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
