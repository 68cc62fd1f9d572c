//! Signed-in session persistence.
//!
//! The access token and user identity live in the local key-value store
//! so a session survives process restarts. The token is opaque to this
//! client; the backend enforces expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SkymarkError;
use crate::storage::{KvStore, KEY_SESSION};

use super::types::TokenResponse;

/// A signed-in session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a token response.
    #[must_use]
    pub fn from_token(token: &TokenResponse) -> Self {
        Self {
            access_token: token.access_token.clone(),
            user_id: token.user.id.clone(),
            email: token.user.email.clone(),
            signed_in_at: Utc::now(),
        }
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored value is corrupt.
    pub fn load(kv: &KvStore<'_>) -> Result<Option<Self>, SkymarkError> {
        match kv.get(KEY_SESSION)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load the stored session, failing if none exists.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::AuthRequired` when no session is stored.
    pub fn require(kv: &KvStore<'_>) -> Result<Self, SkymarkError> {
        Self::load(kv)?.ok_or_else(|| {
            SkymarkError::AuthRequired("run 'skymark login' first".to_string())
        })
    }

    /// Persist this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn save(&self, kv: &KvStore<'_>) -> Result<(), SkymarkError> {
        kv.set(KEY_SESSION, &serde_json::to_string(self)?)
    }

    /// Remove any stored session.
    ///
    /// Returns true if a session was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(kv: &KvStore<'_>) -> Result<bool, SkymarkError> {
        kv.remove(KEY_SESSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::AuthUser;
    use crate::storage::Database;

    fn token() -> TokenResponse {
        TokenResponse {
            access_token: "jwt-token".to_string(),
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("ada@example.org".to_string()),
            },
        }
    }

    #[test]
    fn test_save_and_load() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        assert!(Session::load(&kv).unwrap().is_none());

        let session = Session::from_token(&token());
        session.save(&kv).unwrap();

        let loaded = Session::load(&kv).unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.access_token, "jwt-token");
        assert_eq!(loaded.email.as_deref(), Some("ada@example.org"));
    }

    #[test]
    fn test_require_without_session() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        assert!(matches!(
            Session::require(&kv),
            Err(SkymarkError::AuthRequired(_))
        ));
    }

    #[test]
    fn test_clear() {
        let db = Database::open_in_memory().unwrap();
        let kv = KvStore::new(&db);

        Session::from_token(&token()).save(&kv).unwrap();
        assert!(Session::clear(&kv).unwrap());
        assert!(!Session::clear(&kv).unwrap());
        assert!(Session::load(&kv).unwrap().is_none());
    }
}
