//! Object storage commands.

use crate::backend::BackendClient;
use crate::cli::args::{OutputFormat, StorageCommands};
use crate::config::Config;
use crate::error::SkymarkError;
use crate::output::to_json;
use crate::storage::Database;

use super::require_session;

/// Execute storage subcommands.
///
/// # Errors
///
/// Returns an error if the backend call or output formatting fails.
pub fn storage(
    config: &Config,
    cmd: StorageCommands,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match cmd {
        StorageCommands::Sign { object, expires } => sign(config, &object, expires, format),
    }
}

fn sign(
    config: &Config,
    object: &str,
    expires: u64,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let (bucket, path) = object.split_once('/').ok_or_else(|| {
        SkymarkError::Invalid(format!("'{object}' must be bucket/key (e.g. exports/report.png)"))
    })?;

    let db = Database::open()?;
    let session = require_session(&db)?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);

    let url = client.signed_url(bucket, path, expires)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "object": object,
            "expires_secs": expires,
            "url": url,
        })),
        OutputFormat::Pretty => Ok(url),
    }
}
