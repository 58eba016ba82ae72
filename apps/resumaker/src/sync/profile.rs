//! One-time profile sync. Resume reads and writes wait on its signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::models::user::UserIdentity;
use crate::remote::{ProfileUpdate, RemoteError, ResumeStore};

const MAX_ATTEMPTS: u32 = 3;

/// Upserts the user's profile row, retrying with exponential backoff
/// (1s, 2s). Flips `synced` to `true` on success; on final failure the sender
/// is dropped with `false`, which releases anyone waiting on it.
pub async fn sync_profile(
    store: Arc<dyn ResumeStore>,
    user: UserIdentity,
    synced: watch::Sender<bool>,
) {
    let update = ProfileUpdate {
        email: user.email.clone().unwrap_or_default(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    };

    let mut last_error: Option<RemoteError> = None;
    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "Profile sync attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        match store.sync_user_profile(&update).await {
            Ok(profile) => {
                info!("Profile synced for user {}", profile.clerk_user_id);
                synced.send_replace(true);
                return;
            }
            Err(e) => last_error = Some(e),
        }
    }

    if let Some(e) = last_error {
        error!("Failed to sync user profile for {}: {e}", user.id);
    }
}
