use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness plus a summary of the editor session, `null` when signed out.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let session = state.sessions.current().await.map(|session| {
        json!({
            "userId": session.user().id,
            "profileSynced": session.is_profile_synced(),
            "saveStatus": session.save_status(),
        })
    });

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "session": session,
    }))
}
