//! Typed failures for configuration mutations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("server not found: {0}")]
    NotFound(String),

    #[error("server already exists: {0}")]
    Duplicate(String),

    #[error("index out of range: from={from}, to={to}, len={len}")]
    OutOfRange { from: usize, to: usize, len: usize },

    #[error("no backups available in {}", .0.display())]
    NoBackups(PathBuf),

    #[error("backup file missing: {}", .0.display())]
    MissingBackup(PathBuf),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
