//! Timestamped backups of the desktop config file.
//!
//! Backups live in a `backups/` directory next to the config file and are
//! named `config_<YYYYMMDD_HHMMSS>[_error].json`. Safety copies taken before a
//! restore use `config_before_restore_<YYYYMMDD_HHMMSS>.json`. Only files
//! matching the `config_*.json` pattern are considered backups.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::ConfigError;
use crate::fs::copy_atomic;

pub const DEFAULT_MAX_BACKUPS: usize = 10;
pub const BACKUP_DIR_NAME: &str = "backups";

const BACKUP_PREFIX: &str = "config_";
const BACKUP_EXTENSION: &str = ".json";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const ERROR_MARKER: &str = "_error";
const BEFORE_RESTORE_MARKER: &str = "before_restore_";

/// Why a backup was taken; decides the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    Regular,
    Error,
    BeforeRestore,
}

impl BackupKind {
    fn file_stem(&self, timestamp: &str) -> String {
        match self {
            BackupKind::Regular => format!("{BACKUP_PREFIX}{timestamp}"),
            BackupKind::Error => format!("{BACKUP_PREFIX}{timestamp}{ERROR_MARKER}"),
            BackupKind::BeforeRestore => {
                format!("{BACKUP_PREFIX}{BEFORE_RESTORE_MARKER}{timestamp}")
            }
        }
    }
}

/// A backup file as found in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub filename: String,
    pub timestamp: DateTime<Local>,
    pub size_bytes: u64,
}

impl BackupEntry {
    pub fn is_error(&self) -> bool {
        self.filename
            .trim_end_matches(BACKUP_EXTENSION)
            .contains(ERROR_MARKER)
    }

    pub fn is_before_restore(&self) -> bool {
        self.filename.contains(BEFORE_RESTORE_MARKER)
    }

    /// Size formatted in kilobytes, e.g. `1.5 KB`.
    pub fn display_size(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    backup_dir: PathBuf,
    max_entries: usize,
}

impl BackupStore {
    pub fn new(backup_dir: PathBuf) -> Self {
        Self {
            backup_dir,
            max_entries: DEFAULT_MAX_BACKUPS,
        }
    }

    /// Store for the sibling `backups/` directory of `config_path`.
    pub fn for_config(config_path: &Path) -> Self {
        let parent = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(parent.join(BACKUP_DIR_NAME))
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn path_of(&self, entry: &BackupEntry) -> PathBuf {
        self.backup_dir.join(&entry.filename)
    }

    /// Copy `current` into the backup directory and apply retention.
    ///
    /// Returns `None` when there is nothing to back up or the copy failed.
    pub fn backup(&self, current: &Path, mark_error: bool) -> Option<BackupEntry> {
        if !current.exists() {
            tracing::debug!(path = %current.display(), "No config file to back up");
            return None;
        }

        let kind = if mark_error {
            BackupKind::Error
        } else {
            BackupKind::Regular
        };
        match self.copy_into(current, kind) {
            Ok(entry) => {
                tracing::info!(backup = %entry.filename, "Backed up config file");
                self.enforce_retention(self.max_entries);
                Some(entry)
            }
            Err(err) => {
                tracing::error!(path = %current.display(), error = %err, "Config backup failed");
                None
            }
        }
    }

    /// Delete the oldest backups (by modification time) beyond `max_entries`.
    ///
    /// Returns how many files were removed.
    pub fn enforce_retention(&self, max_entries: usize) -> usize {
        let mut backups = self.scan();
        if backups.len() <= max_entries {
            return 0;
        }

        backups.sort_by(|(a, a_time), (b, b_time)| {
            a_time
                .cmp(b_time)
                .then_with(|| name_order(&a.filename, &b.filename))
        });

        let excess = backups.len() - max_entries;
        let mut removed = 0;
        for (entry, _) in backups.into_iter().take(excess) {
            let path = self.path_of(&entry);
            match fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    tracing::info!(backup = %entry.filename, "Removed old backup");
                }
                Err(err) => {
                    tracing::error!(path = %path.display(), error = %err, "Failed to remove old backup");
                }
            }
        }
        removed
    }

    /// All backups, most recent first.
    pub fn list_backups(&self) -> Vec<BackupEntry> {
        let mut entries: Vec<BackupEntry> = self.scan().into_iter().map(|(e, _)| e).collect();
        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| name_order(&b.filename, &a.filename))
        });
        entries
    }

    pub fn find(&self, filename: &str) -> Option<BackupEntry> {
        self.scan()
            .into_iter()
            .map(|(entry, _)| entry)
            .find(|entry| entry.filename == filename)
    }

    /// Overwrite `target` with a backup (the most recent one when `chosen` is `None`).
    ///
    /// The current content of `target`, if any, is first saved as a
    /// `before_restore` backup so the restore itself can be undone.
    pub fn restore(
        &self,
        target: &Path,
        chosen: Option<&BackupEntry>,
    ) -> Result<BackupEntry, ConfigError> {
        let entry = match chosen {
            Some(entry) => entry.clone(),
            None => self
                .list_backups()
                .into_iter()
                .next()
                .ok_or_else(|| ConfigError::NoBackups(self.backup_dir.clone()))?,
        };

        let source = self.path_of(&entry);
        if !source.is_file() {
            return Err(ConfigError::MissingBackup(source));
        }

        if target.exists() {
            let safety = self.copy_into(target, BackupKind::BeforeRestore)?;
            tracing::info!(backup = %safety.filename, "Saved current config before restore");
        }

        copy_atomic(&source, target)?;
        tracing::info!(
            backup = %entry.filename,
            path = %target.display(),
            "Restored config from backup"
        );
        Ok(entry)
    }

    fn copy_into(&self, current: &Path, kind: BackupKind) -> std::io::Result<BackupEntry> {
        fs::create_dir_all(&self.backup_dir)?;

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let dest = self.unique_path(&kind.file_stem(&timestamp));

        // Read + write rather than fs::copy so the backup gets a fresh mtime;
        // retention orders by when the backup was taken.
        let bytes = fs::read(current)?;
        fs::write(&dest, &bytes)?;

        let metadata = fs::metadata(&dest)?;
        Ok(BackupEntry {
            filename: file_name_of(&dest),
            timestamp: modified_time(&metadata).into(),
            size_bytes: metadata.len(),
        })
    }

    fn unique_path(&self, stem: &str) -> PathBuf {
        let mut candidate = self.backup_dir.join(format!("{stem}{BACKUP_EXTENSION}"));
        let mut counter = 1;
        while candidate.exists() {
            candidate = self
                .backup_dir
                .join(format!("{stem}_{counter}{BACKUP_EXTENSION}"));
            counter += 1;
        }
        candidate
    }

    fn scan(&self) -> Vec<(BackupEntry, SystemTime)> {
        let read_dir = match fs::read_dir(&self.backup_dir) {
            Ok(read_dir) => read_dir,
            Err(_) => return Vec::new(),
        };

        let mut entries = Vec::new();
        for dir_entry in read_dir.flatten() {
            let filename = dir_entry.file_name().to_string_lossy().to_string();
            if !is_backup_name(&filename) {
                continue;
            }
            let Ok(metadata) = dir_entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = modified_time(&metadata);
            entries.push((
                BackupEntry {
                    filename,
                    timestamp: modified.into(),
                    size_bytes: metadata.len(),
                },
                modified,
            ));
        }
        entries
    }
}

fn is_backup_name(filename: &str) -> bool {
    filename.starts_with(BACKUP_PREFIX) && filename.ends_with(BACKUP_EXTENSION)
}

/// Orders `config_T.json` < `config_T_2.json` < `config_T_10.json` for
/// backups whose mtimes tie.
fn name_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn modified_time(metadata: &fs::Metadata) -> SystemTime {
    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
