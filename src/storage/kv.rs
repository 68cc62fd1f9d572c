//! Local key-value state.
//!
//! Holds the two pieces of durable device state that live outside the
//! sync queue: the serialized auth session and the last successful sync
//! timestamp.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::error::SkymarkError;

use super::Database;

/// Key under which the serialized auth session is stored.
pub const KEY_SESSION: &str = "session";

/// Key under which the last successful sync timestamp is stored.
pub const KEY_LAST_SYNC: &str = "last_sync_at";

/// Key-value accessor over an open database.
pub struct KvStore<'a> {
    db: &'a Database,
}

impl<'a> KvStore<'a> {
    /// Create a key-value accessor over an existing database.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, key: &str) -> Result<Option<String>, SkymarkError> {
        self.db
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| SkymarkError::Database(format!("Failed to read key {key}: {e}")))
    }

    /// Set a value, replacing any existing value for the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set(&self, key: &str, value: &str) -> Result<(), SkymarkError> {
        self.db
            .connection()
            .execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to write key {key}: {e}")))?;

        Ok(())
    }

    /// Remove a key.
    ///
    /// Returns true if a value was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove(&self, key: &str) -> Result<bool, SkymarkError> {
        let rows = self
            .db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map_err(|e| SkymarkError::Database(format!("Failed to remove key {key}: {e}")))?;

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        assert!(kv.get("missing").unwrap().is_none());

        kv.set(KEY_LAST_SYNC, "2025-06-01T12:00:00Z").unwrap();
        assert_eq!(
            kv.get(KEY_LAST_SYNC).unwrap().as_deref(),
            Some("2025-06-01T12:00:00Z")
        );
    }

    #[test]
    fn test_set_overwrites() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        kv.set("k", "one").unwrap();
        kv.set("k", "two").unwrap();

        assert_eq!(kv.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_remove() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        kv.set("k", "v").unwrap();
        assert!(kv.remove("k").unwrap());
        assert!(!kv.remove("k").unwrap());
        assert!(kv.get("k").unwrap().is_none());
    }
}
