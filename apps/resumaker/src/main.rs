mod cache;
mod config;
mod editor;
mod errors;
mod identity;
mod models;
mod remote;
mod routes;
mod state;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::LocalCache;
use crate::config::Config;
use crate::editor::SessionManager;
use crate::identity::{IdentityProvider, StaticIdentity};
use crate::remote::{ResumeStore, SupabaseClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumaker v{}", env!("CARGO_PKG_VERSION"));

    let identity: Arc<dyn IdentityProvider> = Arc::new(StaticIdentity::new(
        config.identity(),
        config.auth_token.clone(),
    ));

    let store: Arc<dyn ResumeStore> = Arc::new(SupabaseClient::new(
        &config.supabase_url,
        config.supabase_anon_key.clone(),
        Arc::clone(&identity),
    )?);
    info!("Resume store client initialized ({})", config.supabase_url);

    let cache = LocalCache::new(&config.cache_dir);
    info!("Local cache at {}", cache.path().display());

    let settings = config.autosave();
    info!(
        "Autosave debounce {}ms, status reset {}ms",
        settings.debounce.as_millis(),
        settings.status_reset.as_millis()
    );

    let sessions = Arc::new(SessionManager::new(identity, store, cache, settings));

    // Start editing right away when a user is already signed in
    match sessions.start().await {
        Ok(session) => info!("Signed in as {}", session.user().id),
        Err(e) => warn!("No editor session at startup: {e}"),
    }

    let state = AppState {
        sessions: Arc::clone(&sessions),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the editor's origin

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sessions.end().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutting down");
}
