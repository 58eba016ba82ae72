use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::models::user::UserIdentity;
use crate::sync::reconciler::{DEFAULT_DEBOUNCE, DEFAULT_STATUS_RESET};
use crate::sync::AutosaveSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub auth_token: Option<String>,
    pub cache_dir: PathBuf,
    pub autosave_debounce: Duration,
    pub save_status_reset: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let cache_dir = match optional_env("CACHE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .context("Could not determine cache directory; set CACHE_DIR")?
                .join("resumaker"),
        };

        Ok(Config {
            supabase_url: require_env("SUPABASE_URL")?,
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            user_id: optional_env("USER_ID"),
            user_email: optional_env("USER_EMAIL"),
            user_first_name: optional_env("USER_FIRST_NAME"),
            user_last_name: optional_env("USER_LAST_NAME"),
            auth_token: optional_env("AUTH_TOKEN"),
            cache_dir,
            autosave_debounce: millis_env("AUTOSAVE_DEBOUNCE_MS", DEFAULT_DEBOUNCE)?,
            save_status_reset: millis_env("SAVE_STATUS_RESET_MS", DEFAULT_STATUS_RESET)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The configured user, present only when `USER_ID` is set.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.user_id.as_ref().map(|id| UserIdentity {
            id: id.clone(),
            email: self.user_email.clone(),
            first_name: self.user_first_name.clone(),
            last_name: self.user_last_name.clone(),
        })
    }

    pub fn autosave(&self) -> AutosaveSettings {
        AutosaveSettings {
            debounce: self.autosave_debounce,
            status_reset: self.save_status_reset,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn millis_env(key: &str, default: Duration) -> Result<Duration> {
    match optional_env(key) {
        Some(raw) => parse_millis(&raw).with_context(|| format!("{key} must be a number of milliseconds")),
        None => Ok(default),
    }
}

fn parse_millis(raw: &str) -> Result<Duration> {
    Ok(Duration::from_millis(raw.trim().parse::<u64>()?))
}
