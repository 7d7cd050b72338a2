//! Config store for loading, validating and saving the desktop config file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::ConfigError;
use crate::fs::write_atomic;
use crate::types::ServerRecord;

use super::backup::{BackupEntry, BackupStore};
use super::paths::PathResolver;
use super::schema::{self, PersistedConfig};

/// Mutation locks shared by every store in the process, keyed by config path.
static WRITE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// A loaded config plus whether loading already preserved the file as an
/// `_error` backup.
struct Loaded {
    config: PersistedConfig,
    preserved_as_error: bool,
}

/// Owns the server list of one desktop config file.
///
/// Every mutation runs load → validate → backup → write under a lock shared
/// by all stores for the same file in this process, so mutations never
/// interleave. Other processes writing the same file are not coordinated.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    backups: BackupStore,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    pub fn new(config_path: PathBuf) -> Self {
        let backups = BackupStore::for_config(&config_path);
        let write_lock = shared_lock(&config_path);
        Self {
            config_path,
            backups,
            write_lock,
        }
    }

    pub fn from_resolver(resolver: &PathResolver) -> Self {
        Self::new(resolver.resolve_config_path())
    }

    pub fn with_backup_store(mut self, backups: BackupStore) -> Self {
        self.backups = backups;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Read the config file, degrading to the empty default on any failure.
    ///
    /// A file that is not a JSON object is preserved as an `_error` backup
    /// before the default is returned; it is never rewritten here.
    pub fn load(&self) -> PersistedConfig {
        self.load_inner().config
    }

    pub fn validate(config: &Value) -> Result<(), ConfigError> {
        schema::validate(config)
    }

    /// Validate, back up the current file, then atomically replace it.
    pub fn save(&self, config: &Value) -> Result<(), ConfigError> {
        let _guard = self.lock();
        self.save_locked(config, true)
    }

    pub fn get_servers(&self) -> Vec<ServerRecord> {
        let servers = self.load().servers();
        tracing::debug!(count = servers.len(), "Loaded servers");
        servers
    }

    pub fn set_servers(&self, servers: &[ServerRecord]) -> Result<(), ConfigError> {
        let _guard = self.lock();
        let loaded = self.load_inner();
        self.write_servers(loaded, servers)
    }

    pub fn add_server(&self, server: ServerRecord) -> Result<(), ConfigError> {
        if server.name.trim().is_empty() {
            return Err(ConfigError::validation("server name must not be empty"));
        }
        self.mutate(|servers| {
            if servers.iter().any(|s| s.name == server.name) {
                tracing::warn!(server = %server.name, "Server already exists");
                return Err(ConfigError::Duplicate(server.name));
            }
            servers.push(server);
            Ok(())
        })
    }

    pub fn remove_server(&self, name: &str) -> Result<(), ConfigError> {
        self.mutate(|servers| {
            let before = servers.len();
            servers.retain(|s| s.name != name);
            if servers.len() == before {
                tracing::warn!(server = name, "Server to remove not found");
                return Err(ConfigError::NotFound(name.to_string()));
            }
            Ok(())
        })
    }

    /// Move the server at `from` to position `to`; the others shift by one.
    pub fn move_server(&self, from: usize, to: usize) -> Result<(), ConfigError> {
        self.mutate(|servers| {
            let len = servers.len();
            if from >= len || to >= len {
                tracing::error!(from, to, len, "Invalid server index");
                return Err(ConfigError::OutOfRange { from, to, len });
            }
            let server = servers.remove(from);
            servers.insert(to, server);
            Ok(())
        })
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), ConfigError> {
        self.mutate(|servers| {
            let server = servers
                .iter_mut()
                .find(|s| s.name == name)
                .ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
            server.enabled = enabled;
            server.preserved.remove("enabled");
            Ok(())
        })
    }

    /// Backups of this config file, most recent first.
    pub fn list_backups(&self) -> Vec<BackupEntry> {
        self.backups.list_backups()
    }

    /// Restore a backup over the config file (most recent when `None`).
    pub fn restore(&self, chosen: Option<&BackupEntry>) -> Result<BackupEntry, ConfigError> {
        let _guard = self.lock();
        self.backups.restore(&self.config_path, chosen)
    }

    /// Load once under the lock, edit the server list, write it back.
    fn mutate<F>(&self, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Vec<ServerRecord>) -> Result<(), ConfigError>,
    {
        let _guard = self.lock();
        let loaded = self.load_inner();
        let mut servers = loaded.config.servers();
        edit(&mut servers)?;
        self.write_servers(loaded, &servers)
    }

    fn write_servers(&self, loaded: Loaded, servers: &[ServerRecord]) -> Result<(), ConfigError> {
        let Loaded {
            mut config,
            preserved_as_error,
        } = loaded;
        config.set_servers(servers)?;
        self.save_locked(&config.into_value(), !preserved_as_error)
    }

    fn load_inner(&self) -> Loaded {
        let fallback = |preserved_as_error| Loaded {
            config: PersistedConfig::default(),
            preserved_as_error,
        };

        if !self.config_path.exists() {
            tracing::info!(path = %self.config_path.display(), "Config file not found, using defaults");
            return fallback(false);
        }

        let bytes = match std::fs::read(&self.config_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(path = %self.config_path.display(), error = %err, "Failed to read config file");
                return fallback(false);
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(root)) => Loaded {
                config: PersistedConfig::from_map(root),
                preserved_as_error: false,
            },
            Ok(_) => {
                tracing::error!(path = %self.config_path.display(), "Config root is not a JSON object");
                fallback(self.backups.backup(&self.config_path, true).is_some())
            }
            Err(err) => {
                tracing::error!(path = %self.config_path.display(), error = %err, "Failed to parse config file");
                fallback(self.backups.backup(&self.config_path, true).is_some())
            }
        }
    }

    /// `take_backup` is false when the current file was already preserved
    /// by the load that preceded this write.
    fn save_locked(&self, config: &Value, take_backup: bool) -> Result<(), ConfigError> {
        if let Err(err) = schema::validate(config) {
            tracing::error!(error = %err, "Config validation failed, not saving");
            return Err(err);
        }

        if take_backup {
            self.backups.backup(&self.config_path, false);
        }

        let bytes = serde_json::to_vec_pretty(config)?;
        write_atomic(&self.config_path, &bytes).map_err(|err| {
            tracing::error!(path = %self.config_path.display(), error = %err, "Failed to write config file");
            err
        })?;

        tracing::info!(path = %self.config_path.display(), "Saved config file");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The process-wide lock for `config_path`.
///
/// Paths are compared after canonicalizing the parent directory, so
/// `dir/../dir/config.json` and `dir/config.json` share a lock once `dir`
/// exists.
fn shared_lock(config_path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(config_path);
    let mut locks = WRITE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(key).or_default().clone()
}

fn lock_key(config_path: &Path) -> PathBuf {
    let canonical_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .and_then(|p| p.canonicalize().ok());
    match (canonical_parent, config_path.file_name()) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => config_path.to_path_buf(),
    }
}
