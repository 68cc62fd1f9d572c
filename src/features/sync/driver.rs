//! Sync driver for replaying queued operations.
//!
//! The driver drains a user's pending queue items against the remote
//! store in the order they were recorded. Items are independent: a
//! failure is recorded on that item and the drain continues. Nothing here
//! retries automatically; failed items wait for an explicit retry.
//!
//! Drains are serialized through a mutex gate so the periodic timer and a
//! manual sync can never replay the queue concurrently.

use std::sync::{Arc, Mutex};

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use super::operation::{OpKind, QueueItem};
use super::queue::SyncQueue;
use crate::error::SkymarkError;

/// Remote mutation surface the driver replays against.
///
/// The backend client implements this over HTTP; tests substitute an
/// in-memory store.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteStore {
    /// Insert a row into a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected (including duplicates).
    fn insert(&self, table: &str, payload: &Value) -> Result<(), SkymarkError>;

    /// Update the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if no such row exists or the update is rejected.
    fn update(&self, table: &str, id: &str, payload: &Value) -> Result<(), SkymarkError>;

    /// Delete the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if no such row exists or the delete is rejected.
    fn delete(&self, table: &str, id: &str) -> Result<(), SkymarkError>;
}

/// Apply one mutation against the remote store.
///
/// Shared by the driver (replaying queued items) and the online write
/// path (applying directly). Updates and deletes address their row via
/// the `id` field of the payload.
///
/// # Errors
///
/// Returns `SkymarkError::Invalid` when an update/delete payload has no
/// id, or whatever the remote call fails with.
pub fn apply_remote(
    remote: &dyn RemoteStore,
    kind: OpKind,
    table: &str,
    payload: &Value,
) -> Result<(), SkymarkError> {
    match kind {
        OpKind::Insert => remote.insert(table, payload),
        OpKind::Update => {
            let id = super::operation::extract_id(payload).ok_or_else(|| {
                SkymarkError::Invalid(format!("update payload for {table} has no id"))
            })?;
            remote.update(table, &id, payload)
        }
        OpKind::Delete => {
            let id = super::operation::extract_id(payload).ok_or_else(|| {
                SkymarkError::Invalid(format!("delete payload for {table} has no id"))
            })?;
            remote.delete(table, &id)
        }
    }
}

/// Counts from one drain pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DrainReport {
    /// Items picked up by this drain.
    pub processed: usize,
    /// Items that replayed successfully.
    pub synced: usize,
    /// Items that failed and were recorded as such.
    pub failed: usize,
}

impl DrainReport {
    /// True if every processed item synced.
    #[must_use]
    pub const fn all_synced(&self) -> bool {
        self.failed == 0
    }
}

/// Replays pending queue items against the remote store.
pub struct SyncDriver<'a> {
    remote: &'a dyn RemoteStore,
    queue: &'a SyncQueue,
    gate: Arc<Mutex<()>>,
}

impl<'a> SyncDriver<'a> {
    /// Create a driver with its own drain gate.
    #[must_use]
    pub fn new(remote: &'a dyn RemoteStore, queue: &'a SyncQueue) -> Self {
        Self {
            remote,
            queue,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Create a driver sharing an existing drain gate.
    ///
    /// The background sync service and manual syncs pass the same gate so
    /// their drains serialize.
    #[must_use]
    pub const fn with_gate(
        remote: &'a dyn RemoteStore,
        queue: &'a SyncQueue,
        gate: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            remote,
            queue,
            gate,
        }
    }

    /// Replay all of a user's pending items in creation order.
    ///
    /// Items are independent; a failed item is recorded and the drain
    /// moves on. The call blocks if another drain holds the gate.
    ///
    /// # Errors
    ///
    /// Returns an error only for local database failures; remote failures
    /// are recorded per item.
    pub fn drain(&self, user_id: &str) -> Result<DrainReport, SkymarkError> {
        let _guard = self
            .gate
            .lock()
            .map_err(|_| SkymarkError::Database("sync gate poisoned".to_string()))?;

        let pending = self.queue.pending_for(user_id)?;
        let mut report = DrainReport::default();

        for item in pending {
            let Some(item_id) = item.id else { continue };
            report.processed += 1;

            match self.replay(&item) {
                Ok(()) => {
                    self.queue.mark_synced(item_id)?;
                    report.synced += 1;
                    tracing::debug!(item = item_id, table = %item.table, kind = %item.kind, "replayed queue item");
                }
                Err(e) => {
                    let message = e.to_string();
                    self.queue.mark_failed(item_id, &message)?;
                    report.failed += 1;
                    tracing::warn!(item = item_id, table = %item.table, error = %message, "queue item failed to replay");
                }
            }
        }

        Ok(report)
    }

    /// Reset one failed item to pending and immediately drain.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist, is not failed, or the
    /// local database fails.
    pub fn retry_item(&self, user_id: &str, id: i64) -> Result<DrainReport, SkymarkError> {
        self.queue.reset_for_retry(id)?;
        self.drain(user_id)
    }

    /// Replay one item; all failures are item-local.
    fn replay(&self, item: &QueueItem) -> Result<(), SkymarkError> {
        let payload = item.payload_value()?;
        apply_remote(self.remote, item.kind, &item.table, &payload)
    }
}

/// Format a drain report for terminal display.
#[must_use]
pub fn format_drain_report(report: &DrainReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} operations", report.processed));
    lines.push("─".repeat(40));

    if report.synced > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} synced", report.synced).green()
        ));
    }

    if report.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", report.failed).red()
        ));
        lines.push(String::new());
        lines.push(
            "Run 'skymark sync list --status failed' to inspect failures"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::operation::QueueStatus;
    use crate::storage::Database;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    /// In-memory remote table store with real insert/update/delete
    /// semantics: duplicate inserts and updates/deletes of missing rows
    /// are rejected, the way the backend rejects them.
    struct FakeRemote {
        rows: Mutex<HashMap<String, HashMap<String, Value>>>,
        delay: Option<Duration>,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                rows: Mutex::new(HashMap::new()),
                delay: None,
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                rows: Mutex::new(HashMap::new()),
                delay: Some(delay),
            }
        }

        fn contains(&self, table: &str, id: &str) -> bool {
            self.rows
                .lock()
                .unwrap()
                .get(table)
                .is_some_and(|t| t.contains_key(id))
        }

        fn row(&self, table: &str, id: &str) -> Option<Value> {
            self.rows
                .lock()
                .unwrap()
                .get(table)
                .and_then(|t| t.get(id).cloned())
        }

        fn pause(&self) {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
        }
    }

    impl RemoteStore for FakeRemote {
        fn insert(&self, table: &str, payload: &Value) -> Result<(), SkymarkError> {
            self.pause();
            let id = super::super::operation::extract_id(payload)
                .ok_or_else(|| SkymarkError::Invalid("payload has no id".to_string()))?;
            let mut rows = self.rows.lock().unwrap();
            let table_rows = rows.entry(table.to_string()).or_default();
            if table_rows.contains_key(&id) {
                return Err(SkymarkError::Backend {
                    status: 409,
                    message: format!("duplicate key {id}"),
                });
            }
            table_rows.insert(id, payload.clone());
            Ok(())
        }

        fn update(&self, table: &str, id: &str, payload: &Value) -> Result<(), SkymarkError> {
            self.pause();
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(table)
                .and_then(|t| t.get_mut(id))
                .ok_or_else(|| SkymarkError::NotFound(format!("{table} row {id}")))?;
            if let (Value::Object(row), Value::Object(changes)) = (row, payload) {
                for (k, v) in changes {
                    row.insert(k.clone(), v.clone());
                }
            }
            Ok(())
        }

        fn delete(&self, table: &str, id: &str) -> Result<(), SkymarkError> {
            self.pause();
            let mut rows = self.rows.lock().unwrap();
            let removed = rows.get_mut(table).and_then(|t| t.remove(id));
            if removed.is_none() {
                return Err(SkymarkError::NotFound(format!("{table} row {id}")));
            }
            Ok(())
        }
    }

    fn test_queue() -> SyncQueue {
        SyncQueue::with_database(Database::open_in_memory().unwrap())
    }

    fn enqueue(queue: &SyncQueue, kind: OpKind, table: &str, payload: Value) -> i64 {
        let mut item = QueueItem::new("user-1", kind, table, &payload);
        queue.enqueue(&mut item).unwrap();
        item.id.unwrap()
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.all_synced());
    }

    #[test]
    fn test_drain_marks_items_synced() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        let id = enqueue(
            &queue,
            OpKind::Insert,
            "annotations",
            json!({ "id": "ann-1", "label": "crater" }),
        );
        assert_eq!(queue.pending_count("user-1").unwrap(), 1);

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(report.failed, 0);

        let item = queue.get(id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Synced);
        assert!(item.synced_at.is_some());
        assert_eq!(queue.pending_count("user-1").unwrap(), 0);
        assert!(remote.contains("annotations", "ann-1"));
    }

    #[test]
    fn test_drain_replays_in_creation_order() {
        let queue = test_queue();
        let mut remote = MockRemoteStore::new();
        let mut seq = Sequence::new();

        enqueue(
            &queue,
            OpKind::Insert,
            "annotations",
            json!({ "id": "ann-1" }),
        );
        enqueue(
            &queue,
            OpKind::Update,
            "annotations",
            json!({ "id": "ann-1", "label": "dune" }),
        );
        enqueue(
            &queue,
            OpKind::Delete,
            "votes",
            json!({ "id": "vote-1" }),
        );

        remote
            .expect_insert()
            .with(eq("annotations"), eq(json!({ "id": "ann-1" })))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        remote
            .expect_update()
            .with(
                eq("annotations"),
                eq("ann-1"),
                eq(json!({ "id": "ann-1", "label": "dune" })),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        remote
            .expect_delete()
            .with(eq("votes"), eq("vote-1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let driver = SyncDriver::new(&remote, &queue);
        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.synced, 3);
    }

    #[test]
    fn test_update_of_missing_row_is_recorded_failure() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        // The target row was deleted remotely before replay
        let id = enqueue(
            &queue,
            OpKind::Update,
            "annotations",
            json!({ "id": "gone", "label": "dune" }),
        );

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);

        let item = queue.get(id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Failed);
        assert_eq!(item.attempts, 1);
        assert!(item.last_error.as_deref().unwrap().contains("gone"));
        assert_eq!(queue.pending_count("user-1").unwrap(), 0);
    }

    #[test]
    fn test_update_before_insert_fails_loudly() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        // Recorded in the wrong order: the update precedes the insert
        let update_id = enqueue(
            &queue,
            OpKind::Update,
            "annotations",
            json!({ "id": "ann-1", "label": "dune" }),
        );
        let insert_id = enqueue(
            &queue,
            OpKind::Insert,
            "annotations",
            json!({ "id": "ann-1", "label": "crater" }),
        );

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.synced, 1);
        assert_eq!(report.failed, 1);

        // The premature update must not silently succeed
        let update = queue.get(update_id).unwrap().unwrap();
        assert_eq!(update.status, QueueStatus::Failed);
        assert!(update.last_error.is_some());

        let insert = queue.get(insert_id).unwrap().unwrap();
        assert_eq!(insert.status, QueueStatus::Synced);
        assert_eq!(
            remote.row("annotations", "ann-1").unwrap()["label"],
            "crater"
        );
    }

    #[test]
    fn test_insert_then_update_replays_in_order() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        enqueue(
            &queue,
            OpKind::Insert,
            "annotations",
            json!({ "id": "ann-1", "label": "crater" }),
        );
        enqueue(
            &queue,
            OpKind::Update,
            "annotations",
            json!({ "id": "ann-1", "label": "dune" }),
        );

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.synced, 2);
        assert_eq!(
            remote.row("annotations", "ann-1").unwrap()["label"],
            "dune"
        );
    }

    #[test]
    fn test_failure_does_not_abort_drain() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        enqueue(
            &queue,
            OpKind::Delete,
            "annotations",
            json!({ "id": "missing" }),
        );
        let after = enqueue(
            &queue,
            OpKind::Insert,
            "annotations",
            json!({ "id": "ann-2" }),
        );

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);

        let item = queue.get(after).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Synced);
    }

    #[test]
    fn test_corrupt_payload_is_recorded_failure() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        let mut item = QueueItem::new("user-1", OpKind::Insert, "annotations", &json!({}));
        item.payload = "{not json".to_string();
        queue.enqueue(&mut item).unwrap();

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.failed, 1);

        let loaded = queue.get(item.id.unwrap()).unwrap().unwrap();
        assert_eq!(loaded.status, QueueStatus::Failed);
        assert!(loaded.last_error.is_some());
    }

    #[test]
    fn test_retry_resets_then_drains() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        let id = enqueue(
            &queue,
            OpKind::Update,
            "annotations",
            json!({ "id": "ann-1", "label": "dune" }),
        );
        driver.drain("user-1").unwrap();
        assert_eq!(queue.get(id).unwrap().unwrap().status, QueueStatus::Failed);

        // Create the missing row, then retry the failed update
        remote
            .insert("annotations", &json!({ "id": "ann-1", "label": "crater" }))
            .unwrap();

        let report = driver.retry_item("user-1", id).unwrap();
        assert_eq!(report.synced, 1);

        let item = queue.get(id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Synced);
        assert_eq!(item.attempts, 0);
        assert!(item.last_error.is_none());
        assert_eq!(
            remote.row("annotations", "ann-1").unwrap()["label"],
            "dune"
        );
    }

    #[test]
    fn test_drain_is_per_user() {
        let queue = test_queue();
        let remote = FakeRemote::new();
        let driver = SyncDriver::new(&remote, &queue);

        let mut other = QueueItem::new(
            "user-2",
            OpKind::Insert,
            "annotations",
            &json!({ "id": "theirs" }),
        );
        queue.enqueue(&mut other).unwrap();

        let report = driver.drain("user-1").unwrap();
        assert_eq!(report.processed, 0);
        assert!(!remote.contains("annotations", "theirs"));
    }

    #[test]
    fn test_concurrent_drains_serialize_through_gate() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("queue.db");

        let setup = SyncQueue::with_database(Database::open_at(&db_path).unwrap());
        for i in 0..3 {
            enqueue(
                &setup,
                OpKind::Insert,
                "annotations",
                json!({ "id": format!("ann-{i}") }),
            );
        }
        drop(setup);

        let remote = FakeRemote::with_delay(Duration::from_millis(30));
        let gate = Arc::new(Mutex::new(()));

        // Queue connections are not Sync, so each thread opens its own
        // handle over the same database file
        let (report_a, report_b) = std::thread::scope(|scope| {
            let drain = || {
                let queue = SyncQueue::with_database(Database::open_at(&db_path).unwrap());
                let driver = SyncDriver::with_gate(&remote, &queue, Arc::clone(&gate));
                driver.drain("user-1").unwrap()
            };
            let a = scope.spawn(drain);
            let b = scope.spawn(drain);
            (a.join().unwrap(), b.join().unwrap())
        });

        // Whoever went second saw an already-drained queue; duplicate
        // replays would have hit the fake's duplicate-key rejection.
        assert_eq!(report_a.processed + report_b.processed, 3);
        assert_eq!(report_a.synced + report_b.synced, 3);
        assert_eq!(report_a.failed + report_b.failed, 0);
    }
}
