//! Local cache of parsed catalog records, gated by file age.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::fs::write_atomic;
use crate::types::CatalogRecord;

pub const CACHE_FILE_NAME: &str = "mcp_servers.json";

#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_file: PathBuf,
}

impl CacheStore {
    pub fn new(cache_file: PathBuf) -> Self {
        Self { cache_file }
    }

    /// Cache under `~/.mcp_config_manager/cache/`.
    pub fn default_location() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(&home.join(".mcp_config_manager").join("cache"))
    }

    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(CACHE_FILE_NAME))
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// True when the cache file exists and was written less than `ttl` ago.
    pub fn is_valid(&self, ttl: Duration) -> bool {
        let modified = match std::fs::metadata(&self.cache_file).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < ttl,
            // mtime in the future: treat as fresh
            Err(_) => true,
        }
    }

    pub fn read(&self) -> Option<Vec<CatalogRecord>> {
        let bytes = match std::fs::read(&self.cache_file) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(path = %self.cache_file.display(), error = %err, "Catalog cache unavailable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Some(records),
            Err(err) => {
                tracing::error!(path = %self.cache_file.display(), error = %err, "Failed to parse catalog cache");
                None
            }
        }
    }

    pub fn write(&self, records: &[CatalogRecord]) {
        let bytes = match serde_json::to_vec_pretty(records) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize catalog cache");
                return;
            }
        };
        match write_atomic(&self.cache_file, &bytes) {
            Ok(()) => {
                tracing::info!(path = %self.cache_file.display(), count = records.len(), "Saved catalog cache");
            }
            Err(err) => {
                tracing::error!(path = %self.cache_file.display(), error = %err, "Failed to write catalog cache");
            }
        }
    }
}
