/*!
 * Persistent translation cache.
 *
 * This module maps a subtitle line (exact text, no normalization) to the
 * translation payload returned for it. Entries are written once and never
 * replaced, so a line is sent to the translation service at most once
 * across runs.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use log::debug;
use rusqlite::{OptionalExtension, params};

use crate::database::DatabaseConnection;
use crate::database::connection::DatabaseStats;
use crate::errors::CacheError;
use crate::providers::TranslationResult;

/// Hit/miss counters for one run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Translation cache backed by SQLite
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Underlying database
    db: DatabaseConnection,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Open the cache at `path`, creating the file if it is missing
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Ok(Self::with_connection(DatabaseConnection::new(path)?))
    }

    /// Create a throwaway cache (for testing)
    pub fn in_memory() -> Result<Self, CacheError> {
        Ok(Self::with_connection(DatabaseConnection::new_in_memory()?))
    }

    fn with_connection(db: DatabaseConnection) -> Self {
        Self {
            db,
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Default cache location under the user data directory
    pub fn default_path() -> Option<PathBuf> {
        DatabaseConnection::default_database_path()
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Get a translation from the cache
    pub async fn get(&self, source_text: &str) -> Result<Option<TranslationResult>, CacheError> {
        let key = source_text.to_string();
        let payload: Option<String> = self
            .db
            .execute_async(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT payload FROM translations WHERE source_text = ?1",
                        params![key],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        match payload {
            Some(payload) => {
                self.hits.fetch_add(1, Ordering::SeqCst);
                debug!("Cache hit for '{}'", truncate_text(source_text, 30));

                let result = serde_json::from_str::<TranslationResult>(&payload).map_err(|source| {
                    CacheError::CorruptEntry {
                        key: source_text.to_string(),
                        source,
                    }
                })?;
                Ok(Some(result))
            }
            None => {
                self.misses.fetch_add(1, Ordering::SeqCst);
                debug!("Cache miss for '{}'", truncate_text(source_text, 30));
                Ok(None)
            }
        }
    }

    /// Store a translation in the cache.
    ///
    /// Returns `false` when the key already existed; the stored value is left untouched.
    pub async fn store(&self, source_text: &str, result: &TranslationResult) -> Result<bool, CacheError> {
        let key = source_text.to_string();
        let payload = serde_json::to_string(result).map_err(|source| CacheError::CorruptEntry {
            key: key.clone(),
            source,
        })?;
        let created_at = Utc::now().to_rfc3339();

        let inserted = self
            .db
            .execute_async(move |conn| {
                Ok(conn.execute(
                    "INSERT OR IGNORE INTO translations (source_text, payload, created_at) VALUES (?1, ?2, ?3)",
                    params![key, payload, created_at],
                )?)
            })
            .await?;

        debug!("Cached translation for '{}'", truncate_text(source_text, 30));
        Ok(inserted > 0)
    }

    /// Number of entries stored on disk
    pub async fn len(&self) -> Result<usize, CacheError> {
        let count: i64 = self
            .db
            .execute_async(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?))
            .await?;
        Ok(count as usize)
    }

    pub async fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len().await? == 0)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
        }
    }

    /// Entry count and file size
    pub fn database_stats(&self) -> Result<DatabaseStats, CacheError> {
        self.db.stats()
    }

    /// Close the cache; fails with `CacheError::InUse` while a clone is alive
    pub fn close(self) -> Result<(), CacheError> {
        self.db.close()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
