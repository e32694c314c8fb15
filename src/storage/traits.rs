//! Storage traits and error types
//!
//! This module defines the trait interfaces for the checkpoint store and the
//! HTTP response cache, and their error type.

use crate::state::CrawlCheckpoint;
use crate::storage::{CachedResponse, Registry, RegistryEntry};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persists crawl checkpoints and the subdomain registry
///
/// One process at a time owns a store; no locking is performed.
pub trait CrawlStateStore {
    /// Loads the checkpoint of a subdomain, or `None` if it was never crawled
    fn load(&self, subdomain: &str) -> StorageResult<Option<CrawlCheckpoint>>;

    /// Overwrites the stored checkpoint of a subdomain
    fn save(&mut self, subdomain: &str, checkpoint: &CrawlCheckpoint) -> StorageResult<()>;

    /// Discards the stored checkpoint of a subdomain
    fn reset(&mut self, subdomain: &str) -> StorageResult<()>;

    /// Loads the registry of crawled subdomains
    fn load_registry(&self) -> StorageResult<Registry>;

    /// Sets the registry entry of a subdomain
    fn update_registry(&mut self, subdomain: &str, entry: RegistryEntry) -> StorageResult<()>;
}

/// Store behind the caching HTTP client
pub trait ResponseCache {
    /// Gets the stored response for a URL, fresh or not
    fn get(&self, url: &str) -> StorageResult<Option<CachedResponse>>;

    /// Stores a response, replacing any previous one for the same URL
    fn put(&mut self, response: &CachedResponse) -> StorageResult<()>;

    /// Removes the entries for the given URLs; returns how many existed
    fn evict(&mut self, urls: &[String]) -> StorageResult<usize>;

    /// Removes every entry; returns how many existed
    fn clear(&mut self) -> StorageResult<usize>;

    /// Removes entries fetched longer than `ttl` ago
    fn purge_expired(&mut self, ttl: chrono::Duration) -> StorageResult<usize>;

    /// Number of stored entries
    fn len(&self) -> StorageResult<u64>;

    /// Returns true if nothing is cached
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
