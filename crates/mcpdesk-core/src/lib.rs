//! mcpdesk Core Library
//!
//! Manages the MCP server list of the Claude desktop configuration file
//! (with backups and validation) and a cached catalog of known servers.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fs;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        BackupEntry, BackupStore, ConfigStore, OverrideRecord, PathResolver, PersistedConfig,
    };
    pub use crate::error::ConfigError;

    // Catalog
    pub use crate::catalog::{
        CacheStore, CatalogOrigin, CatalogSnapshot, CatalogSynchronizer, DocumentFetcher,
        SyncOptions,
    };

    // Records
    pub use crate::types::{CatalogRecord, Category, ServerRecord, SourceType};
}
