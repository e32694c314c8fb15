//! SQLite response cache
//!
//! This module provides a SQLite-based implementation of the ResponseCache trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ResponseCache, StorageError, StorageResult};
use crate::storage::CachedResponse;
use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite cache backend
pub struct SqliteResponseCache {
    conn: Connection,
}

impl SqliteResponseCache {
    /// Opens or creates a cache database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteResponseCache)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory cache (for tests and one-off runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ResponseCache for SqliteResponseCache {
    fn get(&self, url: &str) -> StorageResult<Option<CachedResponse>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status, content_type, body, fetched_at FROM responses WHERE url = ?1",
        )?;

        let row = stmt
            .query_row(params![url], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u16>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .optional()?;

        let Some((url, status, content_type, body, fetched_ms)) = row else {
            return Ok(None);
        };

        let fetched_at = Utc.timestamp_millis_opt(fetched_ms).single().ok_or_else(|| {
            StorageError::Corrupt(format!("invalid fetch time {} for {}", fetched_ms, url))
        })?;

        Ok(Some(CachedResponse {
            url,
            status,
            content_type,
            body,
            fetched_at,
        }))
    }

    fn put(&mut self, response: &CachedResponse) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO responses (url, status, content_type, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                response.url,
                response.status,
                response.content_type,
                response.body,
                response.fetched_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn evict(&mut self, urls: &[String]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM responses WHERE url = ?1")?;
            for url in urls {
                removed += stmt.execute(params![url])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn clear(&mut self) -> StorageResult<usize> {
        let removed = self.conn.execute("DELETE FROM responses", [])?;
        Ok(removed)
    }

    fn purge_expired(&mut self, ttl: chrono::Duration) -> StorageResult<usize> {
        // A TTL reaching past the earliest representable time expires nothing
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return Ok(0);
        };
        let removed = self.conn.execute(
            "DELETE FROM responses WHERE fetched_at < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(removed)
    }

    fn len(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
