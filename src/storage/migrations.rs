//! Database migrations for skymark.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry in
//! `MIGRATIONS` upgrades the schema by one version and runs inside the
//! open that first sees the old version.

use rusqlite::Connection;

use crate::error::SkymarkError;

type Migration = fn(&Connection) -> Result<(), SkymarkError>;

/// Migrations in order; index 0 upgrades version 0 to 1.
const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, SkymarkError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| SkymarkError::Database(format!("Failed to get schema version: {e}")))
}

/// Run all pending migrations.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn run(conn: &Connection) -> Result<(), SkymarkError> {
    let current = get_version(conn)?;

    for (index, migration) in MIGRATIONS.iter().enumerate() {
        let version = index as i32 + 1;
        if version <= current {
            continue;
        }
        migration(conn)?;
        conn.execute_batch(&format!("PRAGMA user_version = {version};"))
            .map_err(|e| SkymarkError::Database(format!("Failed to set schema version: {e}")))?;
    }

    Ok(())
}

/// Migration v1: Initial schema.
///
/// Creates tables for:
/// - `sync_queue`: Offline operation queue
/// - `kv_store`: Local key-value state
fn migrate_v1(conn: &Connection) -> Result<(), SkymarkError> {
    conn.execute_batch(
        r"
        -- Sync queue for offline operations
        CREATE TABLE IF NOT EXISTS sync_queue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            op_kind TEXT NOT NULL,
            target_table TEXT NOT NULL,
            payload TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            attempts INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            created_at TEXT NOT NULL,
            synced_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sync_queue_status
        ON sync_queue(status);

        CREATE INDEX IF NOT EXISTS idx_sync_queue_user_created
        ON sync_queue(user_id, created_at);

        -- Local key-value state (session token, last-sync timestamp)
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| SkymarkError::Database(format!("Migration v1 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_v1() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), MIGRATIONS.len() as i32);

        // Verify tables exist by inserting data
        conn.execute(
            "INSERT INTO sync_queue (user_id, op_kind, target_table, payload, created_at)
             VALUES ('user-1', 'insert', 'annotations', '{}', '2025-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES ('last_sync_at', '2025-01-01T10:00:00Z', '2025-01-01T10:00:00Z')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), MIGRATIONS.len() as i32);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();

        // New database should have version 0
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
