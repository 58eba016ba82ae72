use std::sync::Arc;

use crate::editor::SessionManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owner of the active editor session; empty between sign-out and sign-in.
    pub sessions: Arc<SessionManager>,
}
