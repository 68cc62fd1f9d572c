//! Vote and consensus commands.

use crate::backend::types::{NewVote, TABLE_VOTES};
use crate::backend::{BackendClient, Consensus, Votes};
use crate::cli::args::{OutputFormat, VoteCommands};
use crate::config::Config;
use crate::error::SkymarkError;
use crate::features::sync::{HttpProbe, OfflineWriter, OpKind, SyncQueue, WriteOutcome};
use crate::output::{format_consensus, format_votes, to_json};
use crate::storage::Database;

use super::require_session;

/// Execute vote subcommands.
///
/// # Errors
///
/// Returns an error if the backend call, local storage, or output
/// formatting fails.
pub fn vote(
    config: &Config,
    cmd: VoteCommands,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match cmd {
        VoteCommands::Cast {
            annotation_id,
            down,
        } => cast(config, &annotation_id, down, format),
        VoteCommands::List { annotation_id } => list(config, &annotation_id, format),
    }
}

fn cast(
    config: &Config,
    annotation_id: &str,
    down: bool,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    let writer = OfflineWriter::new(&client, &probe, &queue, Some(&session));

    let value = if down { -1 } else { 1 };
    let (id, payload) = NewVote {
        annotation_id: annotation_id.to_string(),
        user_id: session.user_id.clone(),
        value,
    }
    .into_payload();

    let outcome = writer.submit(OpKind::Insert, TABLE_VOTES, payload)?;
    let direction = if down { "downvote" } else { "upvote" };

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "id": id,
            "annotation_id": annotation_id,
            "value": value,
            "queued": matches!(outcome, WriteOutcome::Queued(_)),
        })),
        OutputFormat::Pretty => Ok(match outcome {
            WriteOutcome::Applied => format!("Cast {direction} on {annotation_id}"),
            WriteOutcome::Queued(item) => format!(
                "Cast {direction} on {annotation_id} (offline - queued as item {item})"
            ),
        }),
    }
}

fn list(
    config: &Config,
    annotation_id: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);

    let votes = Votes::new(&client).for_annotation(annotation_id)?;
    format_votes(&votes, format)
}

/// Execute the consensus command.
///
/// # Errors
///
/// Returns an error if the backend call or output formatting fails.
pub fn consensus(
    config: &Config,
    image_id: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);

    let rows = Consensus::new(&client).for_image(image_id)?;
    format_consensus(&rows, image_id, format)
}
