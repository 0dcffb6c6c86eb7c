/*!
 * Translation memory.
 *
 * Persistent cache of previously translated text, keyed by the SHA-256 of
 * the normalized (trimmed) source. Lookups and stores normalize the same way,
 * so whitespace around a unit never causes a miss. The store is SQLite; a
 * committed entry survives process restarts.
 */

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, warn};
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};

use crate::database::DatabaseConnection;
use crate::errors::CacheError;

/// Trim the text the way both lookups and stores do before hashing
pub fn normalize(text: &str) -> &str {
    text.trim()
}

/// Compute the SHA256 hex digest of the normalized text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache statistics for one open handle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryStats {
    /// Lookups that returned a translation
    pub hits: usize,
    /// Lookups that found nothing
    pub misses: usize,
    /// Entries written through this handle
    pub writes: usize,
}

impl MemoryStats {
    /// Fraction of lookups that hit
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Persistent translation memory
pub struct TranslationMemory {
    db: DatabaseConnection,
    hits: AtomicUsize,
    misses: AtomicUsize,
    writes: AtomicUsize,
}

impl TranslationMemory {
    /// Open (or create) the memory at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let db = DatabaseConnection::new(path).map_err(|e| CacheError::Open {
            path: path.to_path_buf(),
            message: format!("{:#}", e),
        })?;
        Ok(Self::with_connection(db))
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let db = DatabaseConnection::new_in_memory().map_err(|e| CacheError::Open {
            path: ":memory:".into(),
            message: format!("{:#}", e),
        })?;
        Ok(Self::with_connection(db))
    }

    fn with_connection(db: DatabaseConnection) -> Self {
        Self {
            db,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Location of the backing store
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Get the stored translation for `text`, if any
    ///
    /// Storage errors are logged and reported as a miss.
    pub fn get(&self, text: &str) -> Option<String> {
        let source = normalize(text);
        if source.is_empty() {
            return None;
        }

        match self.lookup(source) {
            Ok(Some(target)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}'", truncate_text(source, 30));
                Some(target)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!("{}", e);
                None
            }
        }
    }

    fn lookup(&self, source: &str) -> Result<Option<String>, CacheError> {
        let source_hash = hash_text(source);
        self.db
            .execute(|conn| {
                let target = conn
                    .query_row(
                        "SELECT target_text FROM translations WHERE source_hash = ?1",
                        params![source_hash],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(target)
            })
            .map_err(|e| CacheError::Read(e.to_string()))
    }

    /// Store `target` as the translation of `source`; a later save wins
    ///
    /// Empty sources or targets are ignored.
    pub fn save(&self, source: &str, target: &str) -> Result<(), CacheError> {
        let source = normalize(source);
        if source.is_empty() || target.is_empty() {
            return Ok(());
        }

        let source_hash = hash_text(source);
        let created_at = chrono::Utc::now().to_rfc3339();

        self.db
            .execute(|conn| {
                conn.execute(
                    r#"
                    INSERT INTO translations (source_hash, source_text, target_text, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(source_hash) DO UPDATE SET
                        source_text = excluded.source_text,
                        target_text = excluded.target_text,
                        created_at = excluded.created_at
                    "#,
                    params![source_hash, source, target, created_at],
                )?;
                Ok(())
            })
            .map_err(|e| CacheError::Write(e.to_string()))?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!("Cached translation for '{}'", truncate_text(source, 30));
        Ok(())
    }

    /// Number of entries in the store
    pub fn len(&self) -> Result<usize, CacheError> {
        self.db
            .execute(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .map_err(|e| CacheError::Read(e.to_string()))
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Counters for this handle
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// Close the store
    pub fn close(self) -> Result<(), CacheError> {
        self.db.close().map_err(|e| CacheError::Close(e.to_string()))
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
