//! Hosted backend client for skymark.
//!
//! The backend is a managed Postgres + auth + storage + functions stack
//! consumed entirely over HTTP. Nothing here implements storage, spatial
//! queries, or consensus aggregation; those stay server-side. This module
//! provides the signed-in session, the REST client, and one thin wrapper
//! per remote table.

mod client;
mod session;
mod tables;
pub mod types;

pub use client::BackendClient;
pub use session::Session;
pub use tables::{Annotations, Consensus, Profiles, Votes};
