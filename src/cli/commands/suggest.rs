//! Machine region-proposal command.

use serde_json::json;

use crate::backend::types::{
    AnnotationSource, NewAnnotation, RegionProposal, TABLE_ANNOTATIONS,
};
use crate::backend::BackendClient;
use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::error::SkymarkError;
use crate::features::sync::{HttpProbe, OfflineWriter, OpKind, SyncQueue};
use crate::output::{format_proposals, to_json};
use crate::storage::Database;

use super::require_session;

/// Name of the region-suggestion serverless function.
const SUGGEST_FN: &str = "suggest-regions";

/// Execute the suggest command.
///
/// # Errors
///
/// Returns an error if the function call, local storage, or output
/// formatting fails.
pub fn suggest(
    config: &Config,
    image_id: &str,
    save: bool,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    let db = Database::open()?;
    let session = require_session(&db)?;
    let queue = SyncQueue::with_database(db);

    let client = BackendClient::new(&config.backend)?.with_session(&session);
    let body = client.invoke_function(SUGGEST_FN, &json!({ "image_id": image_id }))?;

    // The function wraps its proposals; accept a bare array too
    let proposals: Vec<RegionProposal> = match body.get("proposals") {
        Some(inner) => serde_json::from_value(inner.clone())?,
        None => serde_json::from_value(body)?,
    };

    if !save {
        return format_proposals(&proposals, image_id, format);
    }

    let probe = HttpProbe::new(&config.backend, config.sync.probe_timeout_secs)?;
    let writer = OfflineWriter::new(&client, &probe, &queue, Some(&session));

    let mut saved = 0usize;
    for proposal in &proposals {
        let (_, payload) = NewAnnotation {
            image_id: image_id.to_string(),
            user_id: session.user_id.clone(),
            label: proposal.label.clone(),
            note: Some(format!("confidence {:.2}", proposal.confidence)),
            region: proposal.region.clone(),
            source: AnnotationSource::Machine,
        }
        .into_payload();

        writer.submit(OpKind::Insert, TABLE_ANNOTATIONS, payload)?;
        saved += 1;
    }

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "image_id": image_id,
            "proposals": proposals.len(),
            "saved": saved,
        })),
        OutputFormat::Pretty => Ok(format!(
            "Saved {saved} machine annotations on {image_id}"
        )),
    }
}
