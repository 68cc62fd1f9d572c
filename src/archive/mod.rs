//! NASA image archive client.
//!
//! Read-only client for the public image-search API. The archive is an
//! external collaborator: skymark searches it and links to its assets,
//! nothing more.

mod client;
pub mod types;

pub use client::ArchiveClient;
pub use types::{ImageRecord, SearchPage};
