//! Offline-aware write path.
//!
//! Every mutation the app makes goes through here. With a session and
//! connectivity the write is applied directly; without connectivity it is
//! silently recorded in the sync queue instead of failing the action.
//! Without a session the write is rejected outright and never queued.

use serde_json::Value;

use crate::backend::Session;
use crate::error::SkymarkError;

use super::connectivity::ConnectivityProbe;
use super::driver::{apply_remote, RemoteStore};
use super::operation::{OpKind, QueueItem};
use super::queue::SyncQueue;

/// What happened to a submitted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied directly against the backend.
    Applied,
    /// Recorded in the sync queue; the id is the queue item id.
    Queued(i64),
}

/// Routes writes either to the backend or into the sync queue.
pub struct OfflineWriter<'a> {
    remote: &'a dyn RemoteStore,
    probe: &'a dyn ConnectivityProbe,
    queue: &'a SyncQueue,
    session: Option<&'a Session>,
}

impl<'a> OfflineWriter<'a> {
    /// Create a writer for the given (possibly absent) session.
    #[must_use]
    pub const fn new(
        remote: &'a dyn RemoteStore,
        probe: &'a dyn ConnectivityProbe,
        queue: &'a SyncQueue,
        session: Option<&'a Session>,
    ) -> Self {
        Self {
            remote,
            probe,
            queue,
            session,
        }
    }

    /// Submit a mutation.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::AuthRequired` when no session exists (the
    /// write is not queued), or the remote error when an online apply
    /// fails.
    pub fn submit(
        &self,
        kind: OpKind,
        table: &str,
        payload: Value,
    ) -> Result<WriteOutcome, SkymarkError> {
        let session = self.session.ok_or_else(|| {
            SkymarkError::AuthRequired("run 'skymark login' before writing".to_string())
        })?;

        if self.probe.is_online() {
            apply_remote(self.remote, kind, table, &payload)?;
            return Ok(WriteOutcome::Applied);
        }

        let mut item = QueueItem::new(&session.user_id, kind, table, &payload);
        self.queue.enqueue(&mut item)?;
        let item_id = item.id.unwrap_or_default();
        tracing::debug!(item = item_id, table, kind = %kind, "queued write while offline");
        Ok(WriteOutcome::Queued(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{AuthUser, TokenResponse};
    use crate::features::sync::connectivity::MockConnectivityProbe;
    use crate::features::sync::driver::MockRemoteStore;
    use crate::features::sync::operation::QueueStatus;
    use crate::storage::Database;
    use mockall::predicate::eq;
    use serde_json::json;

    fn session() -> Session {
        Session::from_token(&TokenResponse {
            access_token: "jwt".to_string(),
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        })
    }

    fn test_queue() -> SyncQueue {
        SyncQueue::with_database(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_rejected_without_session_and_never_queued() {
        let queue = test_queue();
        let remote = MockRemoteStore::new();
        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().never();

        let writer = OfflineWriter::new(&remote, &probe, &queue, None);
        let result = writer.submit(OpKind::Insert, "annotations", json!({ "id": "a" }));

        assert!(matches!(result, Err(SkymarkError::AuthRequired(_))));
        assert_eq!(queue.pending_count("user-1").unwrap(), 0);
    }

    #[test]
    fn test_applied_directly_when_online() {
        let queue = test_queue();
        let session = session();

        let mut remote = MockRemoteStore::new();
        remote
            .expect_insert()
            .with(eq("annotations"), eq(json!({ "id": "a" })))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().return_const(true);

        let writer = OfflineWriter::new(&remote, &probe, &queue, Some(&session));
        let outcome = writer
            .submit(OpKind::Insert, "annotations", json!({ "id": "a" }))
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Applied);
        assert_eq!(queue.pending_count("user-1").unwrap(), 0);
    }

    #[test]
    fn test_queued_when_offline() {
        let queue = test_queue();
        let session = session();

        let mut remote = MockRemoteStore::new();
        remote.expect_insert().never();

        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().return_const(false);

        let writer = OfflineWriter::new(&remote, &probe, &queue, Some(&session));
        let outcome = writer
            .submit(OpKind::Insert, "annotations", json!({ "id": "a" }))
            .unwrap();

        let WriteOutcome::Queued(item_id) = outcome else {
            panic!("expected queued outcome");
        };

        let item = queue.get(item_id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.attempts, 0);
        assert_eq!(item.user_id, "user-1");
        assert_eq!(item.table, "annotations");
    }

    #[test]
    fn test_online_failure_surfaces_to_caller() {
        let queue = test_queue();
        let session = session();

        let mut remote = MockRemoteStore::new();
        remote.expect_update().returning(|_, _, _| {
            Err(SkymarkError::Backend {
                status: 403,
                message: "row-level security".to_string(),
            })
        });

        let mut probe = MockConnectivityProbe::new();
        probe.expect_is_online().return_const(true);

        let writer = OfflineWriter::new(&remote, &probe, &queue, Some(&session));
        let result = writer.submit(
            OpKind::Update,
            "annotations",
            json!({ "id": "a", "label": "x" }),
        );

        // A reachable-but-rejecting backend is a user-visible error, not
        // something to queue
        assert!(matches!(result, Err(SkymarkError::Backend { .. })));
        assert_eq!(queue.pending_count("user-1").unwrap(), 0);
    }
}
