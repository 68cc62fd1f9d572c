//! Queue item types for the sync queue.
//!
//! A queue item records one mutation against one remote table: what kind
//! of operation, which table, and the serialized row payload. The payload
//! is trusted to be a well-formed record for its table; the queue does
//! not validate shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SkymarkError;

/// The kind of mutation a queue item replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Insert a new row.
    Insert,
    /// Update an existing row (payload carries the row id).
    Update,
    /// Delete an existing row (payload carries the row id).
    Delete,
}

impl OpKind {
    /// Stable string form used in the database column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse the database column form.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::Invalid` for unknown kinds.
    pub fn parse(s: &str) -> Result<Self, SkymarkError> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(SkymarkError::Invalid(format!(
                "unknown operation kind '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a queued operation.
///
/// The only transitions are `pending -> synced`, `pending -> failed`, and
/// `failed -> pending` via an explicit retry. Synced and failed are
/// otherwise terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Waiting to be replayed.
    Pending,
    /// Successfully replayed against the backend.
    Synced,
    /// Replay failed; awaiting an explicit retry.
    Failed,
}

impl QueueStatus {
    /// Check if this status is terminal absent a manual retry.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Synced | Self::Failed)
    }

    /// Convert from the database column form, defaulting to pending.
    #[must_use]
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "synced" => Self::Synced,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// A queued mutation with its replay bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Row id in the local queue table.
    pub id: Option<i64>,
    /// The user the mutation belongs to.
    pub user_id: String,
    /// Kind of mutation.
    pub kind: OpKind,
    /// Remote table the mutation targets.
    pub table: String,
    /// Serialized JSON record payload.
    pub payload: String,
    /// Current status.
    pub status: QueueStatus,
    /// Number of replay attempts so far.
    pub attempts: i32,
    /// Error message from the most recent failed replay.
    pub last_error: Option<String>,
    /// When the mutation was recorded.
    pub created_at: DateTime<Utc>,
    /// When the mutation was successfully replayed.
    pub synced_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Create a new pending item.
    #[must_use]
    pub fn new(user_id: &str, kind: OpKind, table: &str, payload: &Value) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            kind,
            table: table.to_string(),
            payload: payload.to_string(),
            status: QueueStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            synced_at: None,
        }
    }

    /// Deserialize the payload back into JSON.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::Parse` if the stored payload is corrupt.
    pub fn payload_value(&self) -> Result<Value, SkymarkError> {
        serde_json::from_str(&self.payload).map_err(SkymarkError::Parse)
    }

    /// The target row id carried in the payload, if any.
    ///
    /// Updates and deletes address their row through this field.
    #[must_use]
    pub fn target_id(&self) -> Option<String> {
        serde_json::from_str::<Value>(&self.payload)
            .ok()
            .as_ref()
            .and_then(extract_id)
    }
}

/// Pull the `id` field out of a record payload.
#[must_use]
pub fn extract_id(payload: &Value) -> Option<String> {
    payload.get("id").and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_op_kind_round_trip() {
        for kind in [OpKind::Insert, OpKind::Update, OpKind::Delete] {
            assert_eq!(OpKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(OpKind::parse("upsert").is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(QueueStatus::Synced.is_terminal());
        assert!(QueueStatus::Failed.is_terminal());
        assert!(!QueueStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_from_string() {
        assert_eq!(QueueStatus::from_string("synced"), QueueStatus::Synced);
        assert_eq!(QueueStatus::from_string("FAILED"), QueueStatus::Failed);
        assert_eq!(QueueStatus::from_string("pending"), QueueStatus::Pending);
        assert_eq!(QueueStatus::from_string("garbage"), QueueStatus::Pending);
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = QueueItem::new(
            "user-1",
            OpKind::Insert,
            "annotations",
            &json!({ "id": "ann-1", "label": "crater" }),
        );

        assert_eq!(item.status, QueueStatus::Pending);
        assert_eq!(item.attempts, 0);
        assert!(item.last_error.is_none());
        assert!(item.synced_at.is_none());
        assert_eq!(item.target_id().as_deref(), Some("ann-1"));
    }

    #[test]
    fn test_target_id_missing() {
        let item = QueueItem::new("user-1", OpKind::Insert, "votes", &json!({ "value": 1 }));
        assert!(item.target_id().is_none());
    }

    #[test]
    fn test_payload_value_corrupt() {
        let mut item = QueueItem::new("user-1", OpKind::Insert, "votes", &json!({}));
        item.payload = "{not json".to_string();
        assert!(item.payload_value().is_err());
    }
}
