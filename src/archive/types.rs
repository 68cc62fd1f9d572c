//! Response types for the NASA image archive API.
//!
//! The raw API nests each hit as `{ href, data: [..], links: [..] }`
//! inside a `collection`; `ImageRecord` flattens one hit into the fields
//! the rest of the app cares about.

use serde::{Deserialize, Serialize};

/// Top-level search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub collection: Collection,
}

/// The `collection` envelope around search hits.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    #[serde(default)]
    pub metadata: Option<CollectionMetadata>,
}

/// Search metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionMetadata {
    #[serde(default)]
    pub total_hits: Option<u64>,
}

/// One raw search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    /// URL of the asset manifest for this item.
    pub href: String,
    #[serde(default)]
    pub data: Vec<ItemData>,
    #[serde(default)]
    pub links: Vec<ItemLink>,
}

impl SearchItem {
    /// Flatten this hit into an `ImageRecord`.
    ///
    /// Returns `None` for malformed hits that carry no metadata record.
    #[must_use]
    pub fn into_record(self) -> Option<ImageRecord> {
        let preview_url = self
            .links
            .iter()
            .find(|link| link.rel.as_deref() == Some("preview"))
            .map(|link| link.href.clone());

        self.data.into_iter().next().map(|data| ImageRecord {
            nasa_id: data.nasa_id,
            title: data.title,
            description: data.description,
            media_type: data.media_type,
            date_created: data.date_created,
            center: data.center,
            preview_url,
        })
    }
}

/// Metadata record inside a search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub nasa_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub media_type: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub center: Option<String>,
}

/// Link record inside a search hit (previews, captions).
#[derive(Debug, Clone, Deserialize)]
pub struct ItemLink {
    pub href: String,
    #[serde(default)]
    pub rel: Option<String>,
}

/// Asset manifest for a single item.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub collection: AssetCollection,
}

/// The `collection` envelope around asset links.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetCollection {
    #[serde(default)]
    pub items: Vec<AssetItem>,
}

/// One downloadable asset rendition.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetItem {
    pub href: String,
}

/// A flattened archive image, ready for display or annotation.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    pub nasa_id: String,
    pub title: String,
    pub description: Option<String>,
    pub media_type: String,
    pub date_created: Option<String>,
    pub center: Option<String>,
    /// Preview rendition, when the archive provides one.
    pub preview_url: Option<String>,
}

/// One page of flattened search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub page: u32,
    pub total_hits: Option<u64>,
    pub items: Vec<ImageRecord>,
}
