//! Archive search commands.

use crate::archive::ArchiveClient;
use crate::cli::args::{OutputFormat, SearchArgs};
use crate::config::Config;
use crate::error::SkymarkError;
use crate::output::{format_search, to_json};

/// Execute the search command.
///
/// # Errors
///
/// Returns an error if the archive API call fails or output formatting
/// fails.
pub fn search(
    config: &Config,
    args: &SearchArgs,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let client = ArchiveClient::new(&config.archive)?;
    let page = client.search(&args.query, args.page, args.media_type.as_deref())?;
    format_search(&page, format)
}

/// Execute the asset command.
///
/// # Errors
///
/// Returns an error if the archive API call fails or output formatting
/// fails.
pub fn asset(
    config: &Config,
    nasa_id: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let client = ArchiveClient::new(&config.archive)?;
    let urls = client.asset(nasa_id)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "nasa_id": nasa_id,
            "count": urls.len(),
            "assets": urls,
        })),
        OutputFormat::Pretty => {
            if urls.is_empty() {
                return Ok(format!("No assets for {nasa_id}"));
            }
            let mut lines = vec![format!("Assets for {nasa_id} ({})", urls.len())];
            lines.push("─".repeat(60));
            lines.extend(urls.iter().map(|u| format!("  {u}")));
            Ok(lines.join("\n"))
        }
    }
}
