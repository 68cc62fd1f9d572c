//! Row and payload types for the hosted backend.
//!
//! Field names match the remote column names (snake_case), so rows
//! deserialize directly from the REST responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::Region;

/// Remote table holding annotations.
pub const TABLE_ANNOTATIONS: &str = "annotations";

/// Remote table holding votes.
pub const TABLE_VOTES: &str = "votes";

/// Remote table holding user profiles.
pub const TABLE_PROFILES: &str = "profiles";

/// Remote read-only view with the materialized vote consensus.
pub const VIEW_CONSENSUS: &str = "annotation_consensus";

/// The signed-in user as reported by the auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response from the password-grant token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: AuthUser,
}

/// Who (or what) produced an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationSource {
    /// Drawn by a person.
    User,
    /// Proposed by the region-suggestion function.
    Machine,
}

impl std::fmt::Display for AnnotationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Machine => write!(f, "machine"),
        }
    }
}

/// A row in the `annotations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRow {
    pub id: String,
    pub image_id: String,
    pub user_id: String,
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
    pub region: Region,
    pub source: AnnotationSource,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A new annotation before it has been written anywhere.
///
/// The row id is generated client-side so an offline-queued insert and
/// its later replay describe the same row; replaying an insert that
/// already landed fails on the duplicate key instead of creating a
/// second row.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub image_id: String,
    pub user_id: String,
    pub label: String,
    pub note: Option<String>,
    pub region: Region,
    pub source: AnnotationSource,
}

impl NewAnnotation {
    /// Build the insert payload, minting the client-side row id.
    ///
    /// Returns the generated id along with the payload.
    #[must_use]
    pub fn into_payload(self) -> (String, Value) {
        let id = Uuid::new_v4().to_string();
        let payload = json!({
            "id": id,
            "image_id": self.image_id,
            "user_id": self.user_id,
            "label": self.label,
            "note": self.note,
            "region": self.region,
            "source": self.source,
            "created_at": Utc::now().to_rfc3339(),
        });
        (id, payload)
    }
}

/// A row in the `votes` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRow {
    pub id: String,
    pub annotation_id: String,
    pub user_id: String,
    /// +1 for an upvote, -1 for a downvote.
    pub value: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A new vote before it has been written anywhere.
#[derive(Debug, Clone)]
pub struct NewVote {
    pub annotation_id: String,
    pub user_id: String,
    pub value: i32,
}

impl NewVote {
    /// Build the insert payload, minting the client-side row id.
    #[must_use]
    pub fn into_payload(self) -> (String, Value) {
        let id = Uuid::new_v4().to_string();
        let payload = json!({
            "id": id,
            "annotation_id": self.annotation_id,
            "user_id": self.user_id,
            "value": self.value,
            "created_at": Utc::now().to_rfc3339(),
        });
        (id, payload)
    }
}

/// A row in the `profiles` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A row in the consensus view.
///
/// The aggregate is computed backend-side from votes; this client only
/// reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusRow {
    pub annotation_id: String,
    pub image_id: String,
    pub label: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub score: f64,
}

/// A machine-generated region proposal from the `suggest-regions` function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionProposal {
    pub region: Region,
    pub label: String,
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_annotation_payload() {
        let (id, payload) = NewAnnotation {
            image_id: "PIA12345".to_string(),
            user_id: "user-1".to_string(),
            label: "crater".to_string(),
            note: None,
            region: Region::Rect {
                x: 0.1,
                y: 0.2,
                width: 0.3,
                height: 0.4,
            },
            source: AnnotationSource::User,
        }
        .into_payload();

        assert_eq!(payload["id"], id.as_str());
        assert_eq!(payload["image_id"], "PIA12345");
        assert_eq!(payload["source"], "user");
        assert_eq!(payload["region"]["kind"], "rect");
        assert!(payload["note"].is_null());
    }

    #[test]
    fn test_vote_payload() {
        let (id, payload) = NewVote {
            annotation_id: "ann-1".to_string(),
            user_id: "user-1".to_string(),
            value: -1,
        }
        .into_payload();

        assert_eq!(payload["id"], id.as_str());
        assert_eq!(payload["value"], -1);
    }

    #[test]
    fn test_annotation_row_deserializes() {
        let row: AnnotationRow = serde_json::from_value(serde_json::json!({
            "id": "ann-1",
            "image_id": "PIA12345",
            "user_id": "user-1",
            "label": "dust devil",
            "region": {"kind": "rect", "x": 0.0, "y": 0.0, "width": 0.5, "height": 0.5},
            "source": "machine",
            "created_at": "2025-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(row.source, AnnotationSource::Machine);
        assert!(row.note.is_none());
        assert!(row.created_at.is_some());
    }
}
