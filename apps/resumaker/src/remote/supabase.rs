//! PostgREST client for the Supabase project backing the editor.
//!
//! All requests carry the project's anon key and the signed-in user's bearer
//! token; row-level security on the server scopes rows to that user.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use super::{merge_content, ProfileUpdate, RemoteError, ResumeStore};
use crate::identity::IdentityProvider;
use crate::models::resume::{PersistedContent, ResumeInsert, ResumeRecord, ResumeTemplate};
use crate::models::user::UserProfile;

const RESUMES: &str = "resumes";
const RESUME_TEMPLATES: &str = "resume_templates";
const USER_PROFILES: &str = "user_profiles";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
}

#[derive(Debug, Serialize)]
struct ResumeUpdate<'a> {
    updated_at: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ProfileUpsert<'a> {
    clerk_user_id: &'a str,
    email: &'a str,
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ContentOnly {
    content: Value,
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    rest_url: String,
    anon_key: String,
    identity: Arc<dyn IdentityProvider>,
}

impl SupabaseClient {
    pub fn new(
        project_url: &str,
        anon_key: String,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            anon_key,
            identity,
        })
    }

    /// Resolves the signed-in user id, or fails with `Unauthenticated` naming `action`.
    fn user_id(&self, action: &'static str) -> Result<String, RemoteError> {
        self.identity
            .current_user()
            .map(|u| u.id)
            .ok_or(RemoteError::Unauthenticated(action))
    }

    /// Builds a request against `table` with the anon key and a freshly minted token.
    async fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, RemoteError> {
        let token = self.identity.mint_token().await?;
        Ok(self
            .client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), RemoteError> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}

/// Turns a non-success response into `RemoteError::Api`, preferring the
/// PostgREST `message` over the raw body.
async fn api_error(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(body);
    error!("Store request failed with {status}: {message}");
    RemoteError::Api {
        status: status.as_u16(),
        message,
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<PostgrestError>(&body)
        .map(|e| e.message)
        .unwrap_or(body)
}

fn first_row<T>(rows: Vec<T>) -> Result<T, RemoteError> {
    rows.into_iter().next().ok_or(RemoteError::EmptyResponse)
}

#[async_trait]
impl ResumeStore for SupabaseClient {
    async fn save_resume(
        &self,
        content: &PersistedContent,
        title: &str,
    ) -> Result<ResumeRecord, RemoteError> {
        let user_id = self.user_id("save resume")?;
        let now = Utc::now();
        let row = ResumeInsert {
            user_id: &user_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        };

        let request = self
            .request(Method::POST, RESUMES)
            .await?
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);

        let record = first_row(self.send::<Vec<ResumeRecord>>(request).await?)?;
        debug!("Saved resume {} for user {user_id}", record.id);
        Ok(record)
    }

    async fn get_resumes(&self) -> Result<Vec<ResumeRecord>, RemoteError> {
        let user_id = self.user_id("fetch resumes")?;
        let request = self.request(Method::GET, RESUMES).await?.query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "updated_at.desc".to_string()),
        ]);
        self.send(request).await
    }

    async fn get_resume_by_id(&self, id: Uuid) -> Result<Option<ResumeRecord>, RemoteError> {
        let user_id = self.user_id("fetch resume")?;
        let request = self.request(Method::GET, RESUMES).await?.query(&[
            ("select", "*".to_string()),
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{user_id}")),
        ]);
        let rows: Vec<ResumeRecord> = self.send(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_resume(
        &self,
        id: Uuid,
        partial: Map<String, Value>,
        title: Option<&str>,
    ) -> Result<ResumeRecord, RemoteError> {
        let user_id = self.user_id("update resume")?;

        let content = if partial.is_empty() {
            None
        } else {
            let request = self.request(Method::GET, RESUMES).await?.query(&[
                ("select", "content".to_string()),
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user_id}")),
            ]);
            let current: Vec<ContentOnly> = self.send(request).await?;
            let current = current
                .into_iter()
                .next()
                .ok_or(RemoteError::NotFound(id))?;
            Some(merge_content(&current.content, partial))
        };

        let update = ResumeUpdate {
            updated_at: Utc::now(),
            content,
            title: title.filter(|t| !t.is_empty()),
        };
        let request = self
            .request(Method::PATCH, RESUMES)
            .await?
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user_id}")),
            ])
            .header("Prefer", "return=representation")
            .json(&update);

        let rows: Vec<ResumeRecord> = self.send(request).await?;
        rows.into_iter().next().ok_or(RemoteError::NotFound(id))
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError> {
        let user_id = self.user_id("delete resume")?;
        let request = self.request(Method::DELETE, RESUMES).await?.query(&[
            ("id", format!("eq.{id}")),
            ("user_id", format!("eq.{user_id}")),
        ]);
        self.send_empty(request).await?;
        debug!("Deleted resume {id} for user {user_id}");
        Ok(())
    }

    async fn sync_user_profile(&self, profile: &ProfileUpdate) -> Result<UserProfile, RemoteError> {
        let user_id = self.user_id("sync profile")?;
        let row = ProfileUpsert {
            clerk_user_id: &user_id,
            email: &profile.email,
            first_name: profile.first_name.as_deref(),
            last_name: profile.last_name.as_deref(),
            updated_at: Utc::now(),
        };
        let request = self
            .request(Method::POST, USER_PROFILES)
            .await?
            .query(&[("on_conflict", "clerk_user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);
        first_row(self.send(request).await?)
    }

    async fn get_resume_templates(&self) -> Result<Vec<ResumeTemplate>, RemoteError> {
        let request = self
            .request(Method::GET, RESUME_TEMPLATES)
            .await?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.send(request).await
    }
}
