//! Desktop configuration persistence
//!
//! - `paths`: where the desktop config file lives
//! - `backup`: timestamped copies and retention
//! - `schema`: the two on-disk shapes and validation
//! - `store`: load/save and server list mutations

pub mod backup;
pub mod paths;
pub mod schema;
pub mod store;

pub use backup::{BackupEntry, BackupStore, DEFAULT_MAX_BACKUPS};
pub use paths::{CLAUDE_CONFIG_FILE, OverrideRecord, PathResolver};
pub use schema::{ConfigShape, PersistedConfig, validate};
pub use store::ConfigStore;
