//! Remote server catalog
//!
//! The catalog is the list of known servers published in the MCP servers
//! README. It is fetched over HTTP, parsed, and cached locally for an hour.

pub mod cache;
pub mod category;
pub mod defaults;
pub mod fetcher;
pub mod markdown;
pub mod parser;
pub mod sync;

pub use cache::CacheStore;
pub use category::estimate_category;
pub use defaults::default_catalog;
pub use fetcher::{DocumentFetcher, HttpDocumentFetcher};
pub use parser::{CatalogParser, ParseStrategy, RegexStrategy, StructuredStrategy};
pub use sync::{CatalogOrigin, CatalogSnapshot, CatalogSynchronizer, SyncOptions};
