//! User identity adapter: who is signed in and how to mint bearer tokens for them.
//!
//! The authentication provider itself is external. Everything that needs a
//! user or a token goes through `IdentityProvider`, carried as
//! `Arc<dyn IdentityProvider>`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::UserIdentity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No signed-in user")]
    SignedOut,

    #[error("Failed to get auth token: {0}")]
    Token(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The current user, or `None` before sign-in completes.
    fn current_user(&self) -> Option<UserIdentity>;

    /// Mints a short-lived bearer token for remote calls.
    async fn mint_token(&self) -> Result<String, IdentityError>;
}

/// Identity handed to the process at startup (env or `.env`).
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
    token: Option<String>,
}

impl StaticIdentity {
    pub fn new(user: Option<UserIdentity>, token: Option<String>) -> Self {
        Self { user, token }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }

    async fn mint_token(&self) -> Result<String, IdentityError> {
        if self.user.is_none() {
            return Err(IdentityError::SignedOut);
        }
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IdentityError::Token("no token configured".to_string()))
    }
}
