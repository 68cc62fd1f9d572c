//! Sync queue storage and management.
//!
//! Provides persistence and querying of queued operations. Items are
//! replayed in the order they were recorded; the queue never reorders.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::operation::{OpKind, QueueItem, QueueStatus};
use crate::error::SkymarkError;
use crate::storage::Database;

/// Sync queue for managing offline operations.
pub struct SyncQueue {
    db: Database,
}

impl SyncQueue {
    /// Create a new sync queue over the default database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new() -> Result<Self, SkymarkError> {
        let db = Database::open()?;
        Ok(Self { db })
    }

    /// Create a sync queue with an existing database connection.
    #[must_use]
    pub const fn with_database(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database, for sharing with the key-value store.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Add an operation to the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation cannot be saved.
    pub fn enqueue(&self, item: &mut QueueItem) -> Result<(), SkymarkError> {
        let conn = self.db.connection();

        conn.execute(
            r"INSERT INTO sync_queue
              (user_id, op_kind, target_table, payload, status, attempts, created_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                item.user_id,
                item.kind.as_str(),
                item.table,
                item.payload,
                item.status.to_string(),
                item.attempts,
                item.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| SkymarkError::Database(format!("Failed to enqueue operation: {e}")))?;

        item.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Get a user's pending operations in the order they were recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pending_for(&self, user_id: &str) -> Result<Vec<QueueItem>, SkymarkError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT id, user_id, op_kind, target_table, payload, status,
                         attempts, last_error, created_at, synced_at
                  FROM sync_queue
                  WHERE user_id = ?1 AND status = 'pending'
                  ORDER BY created_at ASC, id ASC",
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt.query_map([user_id], row_to_item).map_err(|e| {
            SkymarkError::Database(format!("Failed to query pending operations: {e}"))
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| SkymarkError::Database(e.to_string()))?);
        }

        Ok(items)
    }

    /// Get all of a user's operations with a given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn by_status(
        &self,
        user_id: &str,
        status: QueueStatus,
    ) -> Result<Vec<QueueItem>, SkymarkError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT id, user_id, op_kind, target_table, payload, status,
                         attempts, last_error, created_at, synced_at
                  FROM sync_queue
                  WHERE user_id = ?1 AND status = ?2
                  ORDER BY created_at DESC, id DESC",
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map(params![user_id, status.to_string()], row_to_item)
            .map_err(|e| SkymarkError::Database(format!("Failed to query operations: {e}")))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| SkymarkError::Database(e.to_string()))?);
        }

        Ok(items)
    }

    /// Get a specific operation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, id: i64) -> Result<Option<QueueItem>, SkymarkError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT id, user_id, op_kind, target_table, payload, status,
                         attempts, last_error, created_at, synced_at
                  FROM sync_queue
                  WHERE id = ?1",
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to prepare query: {e}")))?;

        stmt.query_row([id], row_to_item)
            .optional()
            .map_err(|e| SkymarkError::Database(format!("Failed to query operation: {e}")))
    }

    /// Number of pending operations for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pending_count(&self, user_id: &str) -> Result<i64, SkymarkError> {
        self.db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sync_queue WHERE user_id = ?1 AND status = 'pending'",
                [user_id],
                |row| row.get(0),
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to count pending: {e}")))
    }

    /// A user's failed operations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn failed_items(&self, user_id: &str) -> Result<Vec<QueueItem>, SkymarkError> {
        self.by_status(user_id, QueueStatus::Failed)
    }

    /// Mark an operation as synced.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn mark_synced(&self, id: i64) -> Result<(), SkymarkError> {
        self.db
            .connection()
            .execute(
                "UPDATE sync_queue SET status = 'synced', synced_at = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to mark operation synced: {e}")))?;

        Ok(())
    }

    /// Mark an operation as failed, recording the error and counting the
    /// attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn mark_failed(&self, id: i64, error: &str) -> Result<(), SkymarkError> {
        self.db
            .connection()
            .execute(
                r"UPDATE sync_queue SET
                  status = 'failed',
                  last_error = ?1,
                  attempts = attempts + 1
                  WHERE id = ?2",
                params![error, id],
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to mark operation failed: {e}")))?;

        Ok(())
    }

    /// Reset a failed operation back to pending for another attempt.
    ///
    /// Attempts return to 0 and the recorded error is cleared.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::NotFound` if the item does not exist and
    /// `SkymarkError::Invalid` if it is not in the failed state.
    pub fn reset_for_retry(&self, id: i64) -> Result<QueueItem, SkymarkError> {
        let item = self
            .get(id)?
            .ok_or_else(|| SkymarkError::NotFound(format!("queue item {id}")))?;

        if item.status != QueueStatus::Failed {
            return Err(SkymarkError::Invalid(format!(
                "queue item {id} is {}, only failed items can be retried",
                item.status
            )));
        }

        self.db
            .connection()
            .execute(
                r"UPDATE sync_queue SET
                  status = 'pending',
                  attempts = 0,
                  last_error = NULL,
                  synced_at = NULL
                  WHERE id = ?1",
                [id],
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to reset operation: {e}")))?;

        self.get(id)?
            .ok_or_else(|| SkymarkError::NotFound(format!("queue item {id}")))
    }

    /// Delete a user's synced operations.
    ///
    /// Pending and failed items are untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear_synced(&self, user_id: &str) -> Result<usize, SkymarkError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM sync_queue WHERE user_id = ?1 AND status = 'synced'",
                [user_id],
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to clear synced items: {e}")))
    }

    /// Get queue statistics for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn stats(&self, user_id: &str) -> Result<QueueStats, SkymarkError> {
        let conn = self.db.connection();

        let count = |status: &str| -> Result<i64, SkymarkError> {
            conn.query_row(
                "SELECT COUNT(*) FROM sync_queue WHERE user_id = ?1 AND status = ?2",
                params![user_id, status],
                |row| row.get(0),
            )
            .map_err(|e| SkymarkError::Database(format!("Failed to count {status}: {e}")))
        };

        let pending = count("pending")?;
        let synced = count("synced")?;
        let failed = count("failed")?;

        let oldest_pending: Option<String> = conn
            .query_row(
                r"SELECT created_at FROM sync_queue
                  WHERE user_id = ?1 AND status = 'pending'
                  ORDER BY created_at ASC, id ASC LIMIT 1",
                [user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| SkymarkError::Database(format!("Failed to get oldest pending: {e}")))?;

        Ok(QueueStats {
            pending,
            synced,
            failed,
            oldest_pending: oldest_pending
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone)]
pub struct QueueStats {
    /// Number of pending operations
    pub pending: i64,
    /// Number of synced operations
    pub synced: i64,
    /// Number of failed operations
    pub failed: i64,
    /// Oldest pending operation timestamp
    pub oldest_pending: Option<DateTime<Utc>>,
}

fn row_to_item(row: &Row<'_>) -> Result<QueueItem, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let user_id: String = row.get(1)?;
    let op_kind_str: String = row.get(2)?;
    let table: String = row.get(3)?;
    let payload: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let attempts: i32 = row.get(6)?;
    let last_error: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let synced_at_str: Option<String> = row.get(9)?;

    let kind = OpKind::parse(&op_kind_str).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown operation kind '{op_kind_str}'").into(),
        )
    })?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc));

    let synced_at = synced_at_str.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
    });

    Ok(QueueItem {
        id: Some(id),
        user_id,
        kind,
        table,
        payload,
        status: QueueStatus::from_string(&status_str),
        attempts,
        last_error,
        created_at,
        synced_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_queue() -> SyncQueue {
        let db = Database::open_in_memory().unwrap();
        SyncQueue::with_database(db)
    }

    fn enqueue(queue: &SyncQueue, user: &str, kind: OpKind, payload: serde_json::Value) -> i64 {
        let mut item = QueueItem::new(user, kind, "annotations", &payload);
        queue.enqueue(&mut item).unwrap();
        item.id.unwrap()
    }

    #[test]
    fn test_enqueue_and_get() {
        let queue = create_test_queue();

        let id = enqueue(
            &queue,
            "user-1",
            OpKind::Insert,
            json!({ "id": "ann-1", "label": "crater" }),
        );

        let loaded = queue.get(id).unwrap().unwrap();
        assert_eq!(loaded.kind, OpKind::Insert);
        assert_eq!(loaded.table, "annotations");
        assert_eq!(loaded.status, QueueStatus::Pending);
        assert_eq!(loaded.attempts, 0);
    }

    #[test]
    fn test_pending_preserves_creation_order() {
        let queue = create_test_queue();

        // Deletes and updates do not jump ahead of earlier inserts
        let first = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));
        let second = enqueue(&queue, "user-1", OpKind::Delete, json!({ "id": "b" }));
        let third = enqueue(&queue, "user-1", OpKind::Update, json!({ "id": "a" }));

        let pending = queue.pending_for("user-1").unwrap();
        let ids: Vec<i64> = pending.iter().map(|i| i.id.unwrap()).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[test]
    fn test_pending_is_per_user() {
        let queue = create_test_queue();

        enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));
        enqueue(&queue, "user-2", OpKind::Insert, json!({ "id": "b" }));

        assert_eq!(queue.pending_for("user-1").unwrap().len(), 1);
        assert_eq!(queue.pending_count("user-2").unwrap(), 1);
    }

    #[test]
    fn test_mark_synced_sets_timestamp() {
        let queue = create_test_queue();
        let id = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));

        queue.mark_synced(id).unwrap();

        let loaded = queue.get(id).unwrap().unwrap();
        assert_eq!(loaded.status, QueueStatus::Synced);
        assert!(loaded.synced_at.is_some());
    }

    #[test]
    fn test_mark_failed_records_error_and_attempt() {
        let queue = create_test_queue();
        let id = enqueue(&queue, "user-1", OpKind::Update, json!({ "id": "a" }));

        queue.mark_failed(id, "row not found").unwrap();

        let loaded = queue.get(id).unwrap().unwrap();
        assert_eq!(loaded.status, QueueStatus::Failed);
        assert_eq!(loaded.attempts, 1);
        assert_eq!(loaded.last_error.as_deref(), Some("row not found"));
    }

    #[test]
    fn test_reset_for_retry() {
        let queue = create_test_queue();
        let id = enqueue(&queue, "user-1", OpKind::Update, json!({ "id": "a" }));
        queue.mark_failed(id, "row not found").unwrap();

        let reset = queue.reset_for_retry(id).unwrap();
        assert_eq!(reset.status, QueueStatus::Pending);
        assert_eq!(reset.attempts, 0);
        assert!(reset.last_error.is_none());
    }

    #[test]
    fn test_reset_for_retry_rejects_non_failed() {
        let queue = create_test_queue();
        let id = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));

        assert!(matches!(
            queue.reset_for_retry(id),
            Err(SkymarkError::Invalid(_))
        ));
        assert!(matches!(
            queue.reset_for_retry(9999),
            Err(SkymarkError::NotFound(_))
        ));
    }

    #[test]
    fn test_clear_synced_leaves_pending_and_failed() {
        let queue = create_test_queue();

        let synced = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));
        let pending = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "b" }));
        let failed = enqueue(&queue, "user-1", OpKind::Update, json!({ "id": "c" }));

        queue.mark_synced(synced).unwrap();
        queue.mark_failed(failed, "boom").unwrap();

        assert_eq!(queue.clear_synced("user-1").unwrap(), 1);
        assert!(queue.get(synced).unwrap().is_none());
        assert!(queue.get(pending).unwrap().is_some());
        assert!(queue.get(failed).unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let queue = create_test_queue();

        let a = enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "a" }));
        enqueue(&queue, "user-1", OpKind::Insert, json!({ "id": "b" }));
        let c = enqueue(&queue, "user-1", OpKind::Update, json!({ "id": "c" }));

        queue.mark_synced(a).unwrap();
        queue.mark_failed(c, "boom").unwrap();

        let stats = queue.stats("user-1").unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.synced, 1);
        assert_eq!(stats.failed, 1);
        assert!(stats.oldest_pending.is_some());
    }
}
