//! In-memory `ResumeStore` used by unit tests. Records every save and can be
//! told to fail or to stall.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{merge_content, ProfileUpdate, RemoteError, ResumeStore};
use crate::models::resume::{PersistedContent, ResumeRecord, ResumeTemplate};
use crate::models::user::UserProfile;

pub const TEST_USER_ID: &str = "user_test";

#[derive(Default)]
struct Inner {
    records: Vec<ResumeRecord>,
    saves: Vec<PersistedContent>,
    profile_syncs: usize,
    fail_saves: bool,
    fail_profile_syncs: usize,
    fail_reads: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    save_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_save_delay(delay: Duration) -> Self {
        Self {
            save_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Seeds a remote record with raw `content`.
    pub fn seed(&self, content: Value) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.inner.lock().unwrap().records.push(ResumeRecord {
            id,
            user_id: TEST_USER_ID.to_string(),
            title: "Seeded".to_string(),
            content,
            template_id: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.lock().unwrap().fail_saves = fail;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_next_profile_syncs(&self, count: usize) {
        self.inner.lock().unwrap().fail_profile_syncs = count;
    }

    /// Content of every save call, in call order.
    pub fn saves(&self) -> Vec<PersistedContent> {
        self.inner.lock().unwrap().saves.clone()
    }

    pub fn profile_syncs(&self) -> usize {
        self.inner.lock().unwrap().profile_syncs
    }

    pub fn records(&self) -> Vec<ResumeRecord> {
        self.inner.lock().unwrap().records.clone()
    }
}

fn network_error() -> RemoteError {
    RemoteError::Api {
        status: 503,
        message: "network unavailable".to_string(),
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn save_resume(
        &self,
        content: &PersistedContent,
        title: &str,
    ) -> Result<ResumeRecord, RemoteError> {
        let fail = {
            let mut inner = self.inner.lock().unwrap();
            inner.saves.push(content.clone());
            inner.fail_saves
        };
        if let Some(delay) = self.save_delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(network_error());
        }

        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let content = serde_json::to_value(content)?;
        if let Some(existing) = inner
            .records
            .iter_mut()
            .find(|r| r.user_id == TEST_USER_ID)
        {
            existing.content = content;
            existing.title = title.to_string();
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let record = ResumeRecord {
            id: Uuid::new_v4(),
            user_id: TEST_USER_ID.to_string(),
            title: title.to_string(),
            content,
            template_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn get_resumes(&self) -> Result<Vec<ResumeRecord>, RemoteError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(network_error());
        }
        let mut records = inner.records.clone();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    async fn get_resume_by_id(&self, id: Uuid) -> Result<Option<ResumeRecord>, RemoteError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.records.iter().find(|r| r.id == id).cloned())
    }

    async fn update_resume(
        &self,
        id: Uuid,
        partial: Map<String, Value>,
        title: Option<&str>,
    ) -> Result<ResumeRecord, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RemoteError::NotFound(id))?;
        if !partial.is_empty() {
            record.content = merge_content(&record.content, partial);
        }
        if let Some(title) = title {
            record.title = title.to_string();
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError> {
        self.inner.lock().unwrap().records.retain(|r| r.id != id);
        Ok(())
    }

    async fn sync_user_profile(&self, profile: &ProfileUpdate) -> Result<UserProfile, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.profile_syncs += 1;
        if inner.fail_profile_syncs > 0 {
            inner.fail_profile_syncs -= 1;
            return Err(network_error());
        }
        let now = Utc::now();
        Ok(UserProfile {
            id: Uuid::new_v4(),
            clerk_user_id: TEST_USER_ID.to_string(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_resume_templates(&self) -> Result<Vec<ResumeTemplate>, RemoteError> {
        Ok(Vec::new())
    }
}
