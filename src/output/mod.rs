//! Output formatting for skymark.
//!
//! This module provides formatters for displaying archive and annotation
//! data in human-readable and machine-readable forms.

mod json;
mod pretty;

use crate::archive::SearchPage;
use crate::backend::types::{AnnotationRow, ConsensusRow, RegionProposal, VoteRow};
use crate::cli::args::OutputFormat;
use crate::error::SkymarkError;

pub use json::*;
pub use pretty::*;

/// Format a page of archive search results.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_search(page: &SearchPage, format: OutputFormat) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_search_pretty(page)),
        OutputFormat::Json => to_json(page),
    }
}

/// Format a list of annotations.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_annotations(
    annotations: &[AnnotationRow],
    title: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_annotations_pretty(annotations, title)),
        OutputFormat::Json => format_annotations_json(annotations, title),
    }
}

/// Format a single annotation.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_annotation(
    annotation: &AnnotationRow,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_annotation_pretty(annotation)),
        OutputFormat::Json => to_json(annotation),
    }
}

/// Format the votes on an annotation.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_votes(votes: &[VoteRow], format: OutputFormat) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_votes_pretty(votes)),
        OutputFormat::Json => to_json(votes),
    }
}

/// Format the consensus rows for an image.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_consensus(
    rows: &[ConsensusRow],
    image_id: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_consensus_pretty(rows, image_id)),
        OutputFormat::Json => to_json(rows),
    }
}

/// Format machine region proposals for an image.
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_proposals(
    proposals: &[RegionProposal],
    image_id: &str,
    format: OutputFormat,
) -> Result<String, SkymarkError> {
    match format {
        OutputFormat::Pretty => Ok(format_proposals_pretty(proposals, image_id)),
        OutputFormat::Json => to_json(proposals),
    }
}
