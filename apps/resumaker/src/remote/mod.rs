//! Remote persistence: the resume record, user profile and template tables.
//!
//! Every call needs a signed-in user and a bearer token from the identity
//! adapter. `AppState` and the reconciler hold an `Arc<dyn ResumeStore>`; the
//! production backend is `SupabaseClient`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::identity::IdentityError;
use crate::models::resume::{PersistedContent, ResumeRecord, ResumeTemplate};
use crate::models::user::UserProfile;

pub mod supabase;

#[cfg(test)]
pub mod memory;

pub use supabase::SupabaseClient;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("User must be authenticated to {0}")]
    Unauthenticated(&'static str),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Resume not found: {0}")]
    NotFound(Uuid),

    #[error("Store returned no rows")]
    EmptyResponse,
}

/// Profile fields upserted during the one-time profile sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Upserts the user's resume, keyed on `user_id`.
    async fn save_resume(
        &self,
        content: &PersistedContent,
        title: &str,
    ) -> Result<ResumeRecord, RemoteError>;

    /// All of the user's resumes, most recently updated first.
    async fn get_resumes(&self) -> Result<Vec<ResumeRecord>, RemoteError>;

    async fn get_resume_by_id(&self, id: Uuid) -> Result<Option<ResumeRecord>, RemoteError>;

    /// Shallow-merges `partial` over the stored content and optionally renames.
    async fn update_resume(
        &self,
        id: Uuid,
        partial: Map<String, Value>,
        title: Option<&str>,
    ) -> Result<ResumeRecord, RemoteError>;

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError>;

    /// Upserts the user's profile row, keyed on the identity provider's user id.
    async fn sync_user_profile(&self, profile: &ProfileUpdate) -> Result<UserProfile, RemoteError>;

    async fn get_resume_templates(&self) -> Result<Vec<ResumeTemplate>, RemoteError>;
}

/// Top-level keys of `partial` replace those of `current`. A non-object
/// `current` is treated as empty.
pub fn merge_content(current: &Value, partial: Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    merged.extend(partial);
    Value::Object(merged)
}
