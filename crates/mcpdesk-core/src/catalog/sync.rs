//! Read-through cache in front of the remote catalog.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::ConfigError;
use crate::types::CatalogRecord;

use super::cache::CacheStore;
use super::defaults::default_catalog;
use super::fetcher::{DocumentFetcher, HttpDocumentFetcher};
use super::parser::CatalogParser;

pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/modelcontextprotocol/servers/main/README.md";
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub url: String,
    pub ttl: Duration,
    pub timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SyncOptions {
    /// Reject URLs that are not absolute http(s) and zero timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|err| ConfigError::validation(format!("invalid catalog url '{}': {err}", self.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::validation(format!(
                "catalog url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::validation("fetch timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Where the records of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogOrigin {
    Cache,
    Remote,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub origin: CatalogOrigin,
    pub records: Vec<CatalogRecord>,
}

#[derive(Debug)]
pub struct CatalogSynchronizer<F = HttpDocumentFetcher> {
    cache: CacheStore,
    fetcher: F,
    parser: CatalogParser,
    options: SyncOptions,
}

impl CatalogSynchronizer<HttpDocumentFetcher> {
    pub fn new(cache: CacheStore, options: SyncOptions) -> Self {
        Self::with_fetcher(cache, HttpDocumentFetcher::new(), options)
    }
}

impl<F: DocumentFetcher> CatalogSynchronizer<F> {
    pub fn with_fetcher(cache: CacheStore, fetcher: F, options: SyncOptions) -> Self {
        Self {
            cache,
            fetcher,
            parser: CatalogParser::default(),
            options,
        }
    }

    pub fn with_parser(mut self, parser: CatalogParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn get_catalog(&self, force_refresh: bool) -> Vec<CatalogRecord> {
        self.sync(force_refresh).records
    }

    /// Serve a fresh cache, otherwise fetch and parse, otherwise the built-in list.
    ///
    /// Any path that skips the cache rewrites it, so a failed refresh still
    /// leaves the cache holding the fallback rather than stale data.
    pub fn sync(&self, force_refresh: bool) -> CatalogSnapshot {
        if !force_refresh && self.cache.is_valid(self.options.ttl) {
            if let Some(records) = self.cache.read().filter(|r| !r.is_empty()) {
                tracing::info!(count = records.len(), "Loaded catalog from cache");
                return CatalogSnapshot {
                    origin: CatalogOrigin::Cache,
                    records,
                };
            }
        }

        let parsed = self
            .fetcher
            .fetch(&self.options.url, self.options.timeout)
            .and_then(|document| self.parser.parse(&document));

        let snapshot = match parsed {
            Some(records) => CatalogSnapshot {
                origin: CatalogOrigin::Remote,
                records,
            },
            None => {
                tracing::warn!("Remote catalog unavailable, using built-in list");
                CatalogSnapshot {
                    origin: CatalogOrigin::Fallback,
                    records: default_catalog(),
                }
            }
        };

        self.cache.write(&snapshot.records);
        snapshot
    }
}
