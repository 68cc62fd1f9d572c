//! `SQLite` database connection and operations.
//!
//! The database lives at `~/.skymark/skymark.db` and holds the sync
//! operation queue plus the local key-value state. Opening a database
//! always brings the schema up to date first.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::SkymarkError;

use super::migrations;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location, creating directories,
    /// the file, and the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, SkymarkError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path) -> Result<Self, SkymarkError> {
        let conn = Connection::open(path).map_err(|e| {
            SkymarkError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, SkymarkError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            SkymarkError::Database(format!("Failed to open in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    /// Configure a raw connection and migrate it to the current schema.
    fn from_connection(conn: Connection) -> Result<Self, SkymarkError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| SkymarkError::Database(format!("Failed to enable foreign keys: {e}")))?;

        // The background sync worker opens its own handle to this file,
        // so writers must wait out each other's short transactions
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| SkymarkError::Database(format!("Failed to set busy timeout: {e}")))?;

        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, SkymarkError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    ///
    /// This is primarily for use by feature modules that need direct access.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_version().unwrap() > 0);
    }

    #[test]
    fn test_open_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open_at(&db_path).unwrap();
        assert!(db.schema_version().unwrap() > 0);
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // First open migrates, second open must be a no-op
        {
            let db = Database::open_at(&db_path).unwrap();
            assert!(db.schema_version().unwrap() > 0);
        }
        {
            let db = Database::open_at(&db_path).unwrap();
            assert!(db.schema_version().unwrap() > 0);
        }
    }

    #[test]
    fn test_two_handles_on_one_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let a = Database::open_at(&db_path).unwrap();
        let b = Database::open_at(&db_path).unwrap();

        a.connection()
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES ('k', 'v', 'now')",
                [],
            )
            .unwrap();

        let value: String = b
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = 'k'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(value, "v");
    }
}
