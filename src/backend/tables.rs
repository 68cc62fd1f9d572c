//! Thin data-access wrappers, one per remote table.
//!
//! Each wrapper performs single-table reads through `BackendClient` and
//! deserializes the rows. Writes do not live here; they go through the
//! offline write path so they queue cleanly when connectivity is absent.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SkymarkError;

use super::client::BackendClient;
use super::types::{
    AnnotationRow, ConsensusRow, ProfileRow, VoteRow, TABLE_ANNOTATIONS, TABLE_PROFILES,
    TABLE_VOTES, VIEW_CONSENSUS,
};

fn rows_into<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, SkymarkError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(SkymarkError::Parse))
        .collect()
}

/// Read access to the `annotations` table.
pub struct Annotations<'a> {
    client: &'a BackendClient,
}

impl<'a> Annotations<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// All annotations on an image.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed row.
    pub fn for_image(&self, image_id: &str) -> Result<Vec<AnnotationRow>, SkymarkError> {
        rows_into(
            self.client
                .select(TABLE_ANNOTATIONS, &[("image_id", image_id)])?,
        )
    }

    /// All annotations created by a user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed row.
    pub fn by_user(&self, user_id: &str) -> Result<Vec<AnnotationRow>, SkymarkError> {
        rows_into(
            self.client
                .select(TABLE_ANNOTATIONS, &[("user_id", user_id)])?,
        )
    }

    /// A single annotation by id.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::NotFound` if no such annotation exists.
    pub fn get(&self, id: &str) -> Result<AnnotationRow, SkymarkError> {
        rows_into::<AnnotationRow>(self.client.select(TABLE_ANNOTATIONS, &[("id", id)])?)
            .and_then(|mut rows| {
                if rows.is_empty() {
                    Err(SkymarkError::NotFound(format!("annotation {id}")))
                } else {
                    Ok(rows.remove(0))
                }
            })
    }
}

/// Read access to the `votes` table.
pub struct Votes<'a> {
    client: &'a BackendClient,
}

impl<'a> Votes<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// All votes cast on an annotation.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed row.
    pub fn for_annotation(&self, annotation_id: &str) -> Result<Vec<VoteRow>, SkymarkError> {
        rows_into(
            self.client
                .select(TABLE_VOTES, &[("annotation_id", annotation_id)])?,
        )
    }
}

/// Read access to the materialized consensus view.
pub struct Consensus<'a> {
    client: &'a BackendClient,
}

impl<'a> Consensus<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Consensus rows for every annotation on an image.
    ///
    /// The aggregation itself runs backend-side; stale reads are possible
    /// between view refreshes.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a malformed row.
    pub fn for_image(&self, image_id: &str) -> Result<Vec<ConsensusRow>, SkymarkError> {
        rows_into(
            self.client
                .select(VIEW_CONSENSUS, &[("image_id", image_id)])?,
        )
    }
}

/// Read access to the `profiles` table.
pub struct Profiles<'a> {
    client: &'a BackendClient,
}

impl<'a> Profiles<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// A profile by user id.
    ///
    /// # Errors
    ///
    /// Returns `SkymarkError::NotFound` if no profile exists.
    pub fn get(&self, user_id: &str) -> Result<ProfileRow, SkymarkError> {
        rows_into::<ProfileRow>(self.client.select(TABLE_PROFILES, &[("id", user_id)])?)
            .and_then(|mut rows| {
                if rows.is_empty() {
                    Err(SkymarkError::NotFound(format!("profile {user_id}")))
                } else {
                    Ok(rows.remove(0))
                }
            })
    }
}
