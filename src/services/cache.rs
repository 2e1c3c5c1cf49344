//! Dashboard snapshot caching service
//!
//! Keeps the last successfully loaded dashboard per hotel so the console
//! still has something to show when the backend is unreachable.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::types::{Dashboard, InnpulseError, Result};

/// Cached dashboard for one hotel
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Hotel scope identifier, compared on load since file names are sanitized
    pub scope: String,
    pub updated_at: DateTime<Utc>,
    pub dashboard: Dashboard,
}

/// Service for saving and replaying dashboard snapshots
pub struct SnapshotCacheService {
    cache_dir: PathBuf,
}

impl SnapshotCacheService {
    /// Create a new cache service with default cache directory (~/.innpulse/cache)
    pub fn new() -> Result<Self> {
        let cache_dir = Config::home_dir()
            .ok_or_else(|| InnpulseError::Cache("Cannot determine home directory".into()))?
            .join("cache");
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// Create a cache service with a custom cache directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get the snapshot file path for a hotel scope
    pub fn cache_path(&self, scope: &str) -> PathBuf {
        let safe: String = scope
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}_dashboard.json", safe))
    }

    /// Load the last snapshot. A missing or corrupted file, or one written
    /// for another scope that maps to the same file name, yields `None`.
    pub fn load(&self, scope: &str) -> Result<Option<DashboardSnapshot>> {
        let path = self.cache_path(scope);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path)?;
        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content);
        file.unlock()?;
        read?;

        match serde_json::from_str::<DashboardSnapshot>(&content) {
            Ok(snapshot) if snapshot.scope == scope => Ok(Some(snapshot)),
            Ok(snapshot) => {
                debug!(stored = %snapshot.scope, scope, "snapshot belongs to another scope");
                Ok(None)
            }
            Err(e) => {
                // Corrupted snapshot, behave as if there is none
                debug!(error = %e, path = %path.display(), "ignoring unreadable snapshot");
                Ok(None)
            }
        }
    }

    /// Replace the snapshot for `scope`
    pub fn save(&self, scope: &str, dashboard: &Dashboard) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let snapshot = DashboardSnapshot {
            scope: scope.to_string(),
            updated_at: Utc::now(),
            dashboard: dashboard.clone(),
        };
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| InnpulseError::Cache(format!("Serialization failed: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.cache_path(scope))?;
        file.lock_exclusive()?;
        let written = file
            .set_len(0)
            .and_then(|_| file.write_all(content.as_bytes()));
        file.unlock()?;
        written?;
        Ok(())
    }

    /// Remove the snapshot for `scope`
    pub fn clear(&self, scope: &str) -> Result<()> {
        let path = self.cache_path(scope);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
