//! Local cache: a single JSON snapshot of the persisted content on disk.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::models::resume::{ContentEnvelope, PersistedContent};

/// Fixed slot name the snapshot is stored under.
pub const CACHE_KEY: &str = "resumeMakerContent";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{CACHE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached snapshot. A missing, unreadable or malformed file is a
    /// cache miss, never an error.
    pub async fn load(&self) -> Option<ContentEnvelope> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read local cache {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<ContentEnvelope>(&raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!("Ignoring malformed local cache {}: {e}", self.path.display());
                None
            }
        }
    }

    /// Overwrites the snapshot. Writes to a sibling temp file first so a crash
    /// mid-write leaves the previous snapshot intact.
    pub async fn store(&self, content: &PersistedContent) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(content)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote local cache {}", self.path.display());
        Ok(())
    }
}
