//! Annotation commands.
//!
//! Reads go straight to the backend; writes go through the offline
//! writer so they queue instead of failing when connectivity is absent.

use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use crate::backend::types::{AnnotationSource, NewAnnotation, TABLE_ANNOTATIONS};
use crate::backend::{Annotations, BackendClient};
use crate::cli::args::{AnnotateCommands, OutputFormat};
use crate::config::Config;
use crate::core::Region;
use crate::error::SkymarkError;
use crate::features::sync::{HttpProbe, OfflineWriter, OpKind, SyncQueue, WriteOutcome};
use crate::output::{format_annotation, format_annotations, to_json};
use crate::storage::Database;

use super::require_session;

/// Execute annotation subcommands.
///
/// # Errors
///
/// Returns an error if the backend call, local storage, or output
/// formatting fails.
pub fn annotate(
    config: &Config,
    cmd: AnnotateCommands,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match cmd {
        AnnotateCommands::Add {
            image_id,
            region,
            label,
            note,
        } => add(config, &image_id, &region, &label, note, format),
        AnnotateCommands::List { image, mine } => list(config, image.as_deref(), mine, format),
        AnnotateCommands::Show { id } => show(config, &id, format),
        AnnotateCommands::Update {
            id,
            label,
            note,
            region,
        } => update(config, &id, label, note, region, format),
        AnnotateCommands::Delete { id } => delete(config, &id, format),
    }
}

fn add(
    config: &Config,
    image_id: &str,
    region: &str,
    label: &str,
    note: Option<String>,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let region = Region::parse(region)?;

    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    let writer = OfflineWriter::new(&client, &probe, &queue, Some(&session));

    let (id, payload) = NewAnnotation {
        image_id: image_id.to_string(),
        user_id: session.user_id.clone(),
        label: label.to_string(),
        note,
        region,
        source: AnnotationSource::User,
    }
    .into_payload();

    let outcome = writer.submit(OpKind::Insert, TABLE_ANNOTATIONS, payload)?;
    write_outcome_message("Created annotation", &id, outcome, format)
}

fn list(
    config: &Config,
    image: Option<&str>,
    mine: bool,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let annotations = Annotations::new(&client);

    let (rows, title) = if mine {
        (annotations.by_user(&session.user_id)?, "Mine".to_string())
    } else if let Some(image_id) = image {
        (annotations.for_image(image_id)?, image_id.to_string())
    } else {
        return Err(SkymarkError::Invalid(
            "specify --image <id> or --mine".to_string(),
        ));
    };

    format_annotations(&rows, &title, format)
}

fn show(config: &Config, id: &str, format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let client = BackendClient::new(&config.backend)?.with_session(&session);

    let row = Annotations::new(&client).get(id)?;
    format_annotation(&row, format)
}

fn update(
    config: &Config,
    id: &str,
    label: Option<String>,
    note: Option<String>,
    region: Option<String>,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    if label.is_none() && note.is_none() && region.is_none() {
        return Err(SkymarkError::Invalid(
            "nothing to update; pass --label, --note, or --region".to_string(),
        ));
    }

    let region = region.as_deref().map(Region::parse).transpose()?;

    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    let writer = OfflineWriter::new(&client, &probe, &queue, Some(&session));

    let mut payload = json!({
        "id": id,
        "updated_at": Utc::now().to_rfc3339(),
    });
    if let Some(label) = label {
        payload["label"] = json!(label);
    }
    if let Some(note) = note {
        payload["note"] = json!(note);
    }
    if let Some(region) = region {
        payload["region"] = json!(region);
    }

    let outcome = writer.submit(OpKind::Update, TABLE_ANNOTATIONS, payload)?;
    write_outcome_message("Updated annotation", id, outcome, format)
}

fn delete(config: &Config, id: &str, format: OutputFormat) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    let writer = OfflineWriter::new(&client, &probe, &queue, Some(&session));

    let outcome = writer.submit(OpKind::Delete, TABLE_ANNOTATIONS, json!({ "id": id }))?;
    write_outcome_message("Deleted annotation", id, outcome, format)
}

/// Render the applied/queued outcome of a write.
fn write_outcome_message(
    verb: &str,
    id: &str,
    outcome: WriteOutcome,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "id": id,
            "queued": matches!(outcome, WriteOutcome::Queued(_)),
            "queue_item": match outcome {
                WriteOutcome::Queued(item) => Some(item),
                WriteOutcome::Applied => None,
            },
        })),
        OutputFormat::Pretty => Ok(match outcome {
            WriteOutcome::Applied => format!("{verb}: {id}"),
            WriteOutcome::Queued(item) => format!(
                "{verb}: {id}\n  {}",
                format!("offline - queued for sync (queue item {item})").yellow()
            ),
        }),
    }
}
