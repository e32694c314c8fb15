//! Storage module for persisting crawl data
//!
//! This module handles everything the crawler keeps between runs:
//! - Per-subdomain checkpoints and document tracking files
//! - The registry of crawled subdomains
//! - The SQLite-backed HTTP response cache

mod files;
mod schema;
mod sqlite;
mod traits;

pub use files::{FileStateStore, TRACKING_HEADER};
pub use sqlite::SqliteResponseCache;
pub use traits::{CrawlStateStore, ResponseCache, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Opens or creates the response cache database
pub fn open_response_cache(path: &Path) -> StorageResult<SqliteResponseCache> {
    SqliteResponseCache::open(path)
}

/// A stored HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// When the response was originally fetched from the network
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Returns true if the response is older than `ttl` at `now`
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > ttl
    }
}

/// Registry entry for one subdomain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub document_count: usize,
    pub complete: bool,
}

/// Subdomain name -> registry entry, sorted by name
pub type Registry = BTreeMap<String, RegistryEntry>;
