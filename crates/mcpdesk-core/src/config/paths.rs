//! Desktop config path resolution.
//!
//! Resolution order:
//! 1. `claude_config_file` from the manager override file, if that file exists
//! 2. `claude_config_path` from the override file (a directory)
//! 3. The platform default under the user's config directory

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fs::write_atomic;

/// File name the desktop application reads its server list from.
pub const CLAUDE_CONFIG_FILE: &str = "claude_desktop_config.json";

/// Manager-owned record that points at a non-default desktop config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_config_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_config_path: Option<PathBuf>,
}

impl OverrideRecord {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            claude_config_file: Some(path.into()),
            claude_config_path: None,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            claude_config_file: None,
            claude_config_path: Some(path.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    override_file: PathBuf,
    user_config_dir: PathBuf,
}

impl PathResolver {
    /// Resolver rooted at the current user's home and config directories.
    ///
    /// - Windows: `%APPDATA%\Claude`
    /// - macOS: `~/Library/Application Support/Claude`
    /// - Others: `~/.config/Claude`
    pub fn from_env() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let user_config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
        let override_file = home.join(".config").join("mcp_manager").join("config.json");
        Self::from_paths(override_file, user_config_dir)
    }

    pub fn from_paths(override_file: PathBuf, user_config_dir: PathBuf) -> Self {
        Self {
            override_file,
            user_config_dir,
        }
    }

    pub fn override_file(&self) -> &Path {
        &self.override_file
    }

    /// Path of the desktop config file. Never fails.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(record) = self.read_override() {
            if let Some(file) = record.claude_config_file {
                if file.exists() {
                    tracing::info!(path = %file.display(), "Using config file from override");
                    return file;
                }
                tracing::warn!(
                    path = %file.display(),
                    "Override config file does not exist, ignoring"
                );
            }
            if let Some(dir) = record.claude_config_path {
                tracing::info!(dir = %dir.display(), "Using config directory from override");
                return dir.join(CLAUDE_CONFIG_FILE);
            }
        }
        self.default_config_path()
    }

    /// Platform default path; creates the containing directory if missing.
    pub fn default_config_path(&self) -> PathBuf {
        let dir = self.user_config_dir.join("Claude");
        if let Err(err) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %err, "Failed to create config directory");
        }
        dir.join(CLAUDE_CONFIG_FILE)
    }

    pub fn read_override(&self) -> Option<OverrideRecord> {
        if !self.override_file.exists() {
            return None;
        }
        let bytes = match std::fs::read(&self.override_file) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(
                    path = %self.override_file.display(),
                    error = %err,
                    "Failed to read override file"
                );
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::error!(
                    path = %self.override_file.display(),
                    error = %err,
                    "Failed to parse override file"
                );
                None
            }
        }
    }

    pub fn write_override(&self, record: &OverrideRecord) -> Result<(), ConfigError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.override_file, &bytes)?;
        tracing::info!(path = %self.override_file.display(), "Saved path override");
        Ok(())
    }

    pub fn clear_override(&self) -> Result<(), ConfigError> {
        if self.override_file.exists() {
            std::fs::remove_file(&self.override_file)?;
        }
        Ok(())
    }
}
