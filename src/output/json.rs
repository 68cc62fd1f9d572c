//! JSON output formatting for skymark.
//!
//! This module provides functions for formatting archive and annotation
//! data as JSON.

use serde::Serialize;
use serde_json::json;

use crate::backend::types::AnnotationRow;
use crate::error::SkymarkError;

/// Format annotations as JSON with a list wrapper
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn format_annotations_json(
    annotations: &[AnnotationRow],
    title: &str,
) -> Result<String, SkymarkError> {
    let output = json!({
        "list": title,
        "count": annotations.len(),
        "items": annotations
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `SkymarkError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, SkymarkError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::AnnotationSource;
    use crate::core::Region;

    fn make_annotation(label: &str) -> AnnotationRow {
        AnnotationRow {
            id: "ann-1".to_string(),
            image_id: "PIA12345".to_string(),
            user_id: "user-1".to_string(),
            label: label.to_string(),
            note: None,
            region: Region::Rect {
                x: 0.1,
                y: 0.2,
                width: 0.3,
                height: 0.4,
            },
            source: AnnotationSource::User,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_format_annotations_json_empty() {
        let result = format_annotations_json(&[], "PIA12345").unwrap();

        assert!(result.contains("\"list\": \"PIA12345\""));
        assert!(result.contains("\"count\": 0"));
        assert!(result.contains("\"items\": []"));
    }

    #[test]
    fn test_format_annotations_json_single() {
        let annotations = vec![make_annotation("crater")];
        let result = format_annotations_json(&annotations, "PIA12345").unwrap();

        assert!(result.contains("\"count\": 1"));
        assert!(result.contains("\"label\": \"crater\""));
        assert!(result.contains("\"kind\": \"rect\""));
        assert!(result.contains("\"source\": \"user\""));
    }

    #[test]
    fn test_to_json_generic() {
        let annotation = make_annotation("dust devil");
        let result = to_json(&annotation).unwrap();

        assert!(result.contains("\"label\": \"dust devil\""));
        assert!(result.contains("\"image_id\": \"PIA12345\""));
    }
}
