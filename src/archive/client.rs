//! HTTP client for the NASA image archive search API.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::ArchiveConfig;
use crate::error::SkymarkError;

use super::types::{AssetResponse, SearchPage, SearchResponse};

/// Blocking client for the public image-search endpoint.
pub struct ArchiveClient {
    http: Client,
    base_url: String,
    page_size: u32,
}

impl ArchiveClient {
    /// Build a client from archive settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ArchiveConfig) -> Result<Self, SkymarkError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SkymarkError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    /// Search the archive, returning one page of flattened records.
    ///
    /// Pages are 1-based, matching the remote API.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// malformed response body.
    pub fn search(
        &self,
        query: &str,
        page: u32,
        media_type: Option<&str>,
    ) -> Result<SearchPage, SkymarkError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("page", page.max(1).to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        if let Some(media_type) = media_type {
            params.push(("media_type", media_type.to_string()));
        }

        let resp = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&params)
            .send()
            .map_err(|e| SkymarkError::from_http(&e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SkymarkError::Backend {
                status: status.as_u16(),
                message: format!("archive search for '{query}' failed"),
            });
        }

        let body: SearchResponse = resp
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed search response: {e}")))?;

        let total_hits = body.collection.metadata.and_then(|m| m.total_hits);
        let items = body
            .collection
            .items
            .into_iter()
            .filter_map(super::types::SearchItem::into_record)
            .collect();

        Ok(SearchPage {
            query: query.to_string(),
            page: page.max(1),
            total_hits,
            items,
        })
    }

    /// Fetch the asset manifest for an item: every downloadable rendition URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, an unknown id, or a malformed
    /// response body.
    pub fn asset(&self, nasa_id: &str) -> Result<Vec<String>, SkymarkError> {
        let resp = self
            .http
            .get(format!("{}/asset/{nasa_id}", self.base_url))
            .send()
            .map_err(|e| SkymarkError::from_http(&e))?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(SkymarkError::NotFound(format!("archive item {nasa_id}")));
        }
        if !status.is_success() {
            return Err(SkymarkError::Backend {
                status: status.as_u16(),
                message: format!("asset lookup for '{nasa_id}' failed"),
            });
        }

        let body: AssetResponse = resp
            .json()
            .map_err(|e| SkymarkError::Network(format!("Malformed asset response: {e}")))?;

        Ok(body.collection.items.into_iter().map(|i| i.href).collect())
    }
}
