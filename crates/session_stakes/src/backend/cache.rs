//! SQLite response cache keyed by content hash of the normalized request.

use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed cache for backend responses. Key = SHA-256 of the
/// normalized request parameters.
pub struct ResponseCache {
    conn: Mutex<Connection>,
}

impl ResponseCache {
    /// Open or create the cache at `path`, creating parent directories if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                fetched_utc INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_responses_fetched ON responses(fetched_utc);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Content-hash key for a normalized request identifier.
    pub fn key_for(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Cached JSON body for `key`, `None` on a miss or non-UTF-8 content.
    pub fn get_json(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let mut stmt = conn.prepare("SELECT body FROM responses WHERE key = ?1")?;
        let row = stmt
            .query_row([key], |r| r.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(row.and_then(|b| String::from_utf8(b).ok()))
    }

    /// Insert or replace the JSON body for `key`.
    pub fn put_json(&self, key: &str, json: &str) -> Result<(), CacheError> {
        let fetched = time::OffsetDateTime::now_utc().unix_timestamp();
        let conn = self
            .conn
            .lock()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO responses (key, body, fetched_utc) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, json.as_bytes(), fetched],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_json_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path().join("cache.sqlite")).unwrap();
        let key = ResponseCache::key_for(r#"{"endpoint":"stakes","address":"0xabc"}"#);
        assert_eq!(cache.get_json(&key).unwrap(), None);
        cache.put_json(&key, r#"{"stakes":[]}"#).unwrap();
        assert_eq!(
            cache.get_json(&key).unwrap().as_deref(),
            Some(r#"{"stakes":[]}"#)
        );
    }

    #[test]
    fn key_is_stable_hex() {
        let a = ResponseCache::key_for("payload");
        let b = ResponseCache::key_for("payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
