//! Command implementations for skymark.
//!
//! This module contains the implementation of all CLI commands.

mod annotate;
mod search;
mod session;
mod storage;
mod suggest;
mod sync;
mod vote;

pub use annotate::annotate;
pub use search::{asset, search};
pub use session::{login, logout, whoami};
pub use storage::storage;
pub use suggest::suggest;
pub use sync::sync;
pub use vote::{consensus, vote};

use clap::CommandFactory;
use clap_complete::Shell;

use crate::backend::Session;
use crate::cli::args::Cli;
use crate::error::SkymarkError;
use crate::storage::{Database, KvStore};

/// Generate shell completions to stdout.
///
/// # Errors
///
/// Infallible in practice; kept fallible for uniformity with the other
/// commands.
pub fn completions(shell: Shell) -> Result<String, SkymarkError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "skymark", &mut buf);
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Load the stored session from an open database.
///
/// # Errors
///
/// Returns `SkymarkError::AuthRequired` when no session is stored.
pub(crate) fn require_session(db: &Database) -> Result<Session, SkymarkError> {
    Session::require(&KvStore::new(db))
}
