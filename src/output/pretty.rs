use colored::Colorize;

use crate::archive::SearchPage;
use crate::backend::types::{AnnotationRow, AnnotationSource, ConsensusRow, RegionProposal, VoteRow};

/// Format a page of archive search results as a pretty list
#[must_use]
pub fn format_search_pretty(page: &SearchPage) -> String {
    if page.items.is_empty() {
        return format!("Search \"{}\" (0 results)\n  No results", page.query);
    }

    let total = page
        .total_hits
        .map_or_else(|| page.items.len().to_string(), |t| t.to_string());

    let mut output = format!(
        "Search \"{}\" (page {}, {} total)\n",
        page.query, page.page, total
    );
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for item in &page.items {
        let mut line = format!("{}  {}", item.nasa_id.cyan(), item.title.bold());

        if let Some(date) = &item.date_created {
            let day = date.split('T').next().unwrap_or(date);
            line.push_str(&format!("  {}", day.yellow()));
        }

        if let Some(center) = &item.center {
            line.push_str(&format!("  {}", center.dimmed()));
        }

        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format a list of annotations as a pretty list
#[must_use]
pub fn format_annotations_pretty(annotations: &[AnnotationRow], title: &str) -> String {
    if annotations.is_empty() {
        return format!("{title} (0 annotations)\n  No annotations");
    }

    let mut output = format!("{} ({} annotations)\n", title, annotations.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for annotation in annotations {
        let source_icon = match annotation.source {
            AnnotationSource::User => "●".white(),
            AnnotationSource::Machine => "◆".magenta(),
        };

        let mut line = format!(
            "{} {}  {}  {}",
            source_icon,
            annotation.id.dimmed(),
            annotation.label.bold(),
            annotation.region.summary().cyan()
        );

        if let Some(note) = &annotation.note {
            line.push_str(&format!("  {}", note.dimmed()));
        }

        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format a single annotation with full details
#[must_use]
pub fn format_annotation_pretty(annotation: &AnnotationRow) -> String {
    let mut output = format!("{}\n", annotation.label.bold());
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), annotation.id));
    output.push_str(&format!("  {}: {}\n", "Image".dimmed(), annotation.image_id));
    output.push_str(&format!(
        "  {}: {}\n",
        "Region".dimmed(),
        annotation.region.summary()
    ));
    output.push_str(&format!("  {}: {}\n", "Source".dimmed(), annotation.source));
    output.push_str(&format!("  {}: {}\n", "Author".dimmed(), annotation.user_id));

    if let Some(note) = &annotation.note {
        output.push_str(&format!("  {}: {}\n", "Note".dimmed(), note));
    }

    if let Some(created) = &annotation.created_at {
        output.push_str(&format!(
            "  {}: {}\n",
            "Created".dimmed(),
            created.format("%Y-%m-%d %H:%M")
        ));
    }

    output
}

/// Format votes as a pretty list
#[must_use]
pub fn format_votes_pretty(votes: &[VoteRow]) -> String {
    if votes.is_empty() {
        return "Votes (0)\n  No votes".to_string();
    }

    let up = votes.iter().filter(|v| v.value > 0).count();
    let down = votes.len() - up;

    let mut output = format!(
        "Votes ({}): {} {}\n",
        votes.len(),
        format!("▲ {up}").green(),
        format!("▼ {down}").red()
    );
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for vote in votes {
        let arrow = if vote.value > 0 {
            "▲".green()
        } else {
            "▼".red()
        };
        output.push_str(&format!("  {} {}\n", arrow, vote.user_id.dimmed()));
    }

    output
}

/// Format consensus rows as a pretty table
#[must_use]
pub fn format_consensus_pretty(rows: &[ConsensusRow], image_id: &str) -> String {
    if rows.is_empty() {
        return format!("Consensus for {image_id}\n  No scored annotations yet");
    }

    let mut output = format!("Consensus for {image_id} ({} annotations)\n", rows.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    let mut sorted: Vec<&ConsensusRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

    for row in sorted {
        let score = format!("{:+.2}", row.score);
        let score = if row.score >= 0.0 {
            score.green()
        } else {
            score.red()
        };

        output.push_str(&format!(
            "  {} {}  {}  {} {}\n",
            score,
            row.label.bold(),
            row.annotation_id.dimmed(),
            format!("▲{}", row.upvotes).green(),
            format!("▼{}", row.downvotes).red(),
        ));
    }

    output
}

/// Format machine region proposals as a pretty list
#[must_use]
pub fn format_proposals_pretty(proposals: &[RegionProposal], image_id: &str) -> String {
    if proposals.is_empty() {
        return format!("Proposals for {image_id}\n  No regions proposed");
    }

    let mut output = format!("Proposals for {image_id} ({})\n", proposals.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for (i, proposal) in proposals.iter().enumerate() {
        output.push_str(&format!(
            "  {} {}  {}  {}\n",
            format!("[{i}]").dimmed(),
            proposal.label.bold(),
            proposal.region.summary().cyan(),
            format!("{:.0}%", proposal.confidence * 100.0).yellow(),
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ImageRecord;
    use crate::core::Region;

    fn make_page(items: Vec<ImageRecord>) -> SearchPage {
        SearchPage {
            query: "mars crater".to_string(),
            page: 1,
            total_hits: Some(420),
            items,
        }
    }

    fn make_record(nasa_id: &str) -> ImageRecord {
        ImageRecord {
            nasa_id: nasa_id.to_string(),
            title: "Victoria Crater".to_string(),
            description: None,
            media_type: "image".to_string(),
            date_created: Some("2006-10-06T00:00:00Z".to_string()),
            center: Some("JPL".to_string()),
            preview_url: None,
        }
    }

    #[test]
    fn test_format_search_pretty_empty() {
        let output = format_search_pretty(&make_page(vec![]));
        assert!(output.contains("0 results"));
        assert!(output.contains("No results"));
    }

    #[test]
    fn test_format_search_pretty_items() {
        let output = format_search_pretty(&make_page(vec![make_record("PIA08813")]));
        assert!(output.contains("PIA08813"));
        assert!(output.contains("Victoria Crater"));
        assert!(output.contains("2006-10-06"));
        assert!(output.contains("420 total"));
    }

    #[test]
    fn test_format_annotations_pretty_empty() {
        let output = format_annotations_pretty(&[], "PIA08813");
        assert!(output.contains("No annotations"));
    }

    #[test]
    fn test_format_consensus_sorted_by_score() {
        let rows = vec![
            ConsensusRow {
                annotation_id: "low".to_string(),
                image_id: "PIA08813".to_string(),
                label: "dune".to_string(),
                upvotes: 1,
                downvotes: 3,
                score: -0.5,
            },
            ConsensusRow {
                annotation_id: "high".to_string(),
                image_id: "PIA08813".to_string(),
                label: "crater".to_string(),
                upvotes: 7,
                downvotes: 1,
                score: 0.75,
            },
        ];

        let output = format_consensus_pretty(&rows, "PIA08813");
        let high_pos = output.find("high").unwrap();
        let low_pos = output.find("low").unwrap();
        assert!(high_pos < low_pos);
    }

    #[test]
    fn test_format_proposals_pretty() {
        let proposals = vec![RegionProposal {
            region: Region::Rect {
                x: 0.1,
                y: 0.1,
                width: 0.2,
                height: 0.2,
            },
            label: "crater".to_string(),
            confidence: 0.87,
        }];

        let output = format_proposals_pretty(&proposals, "PIA08813");
        assert!(output.contains("crater"));
        assert!(output.contains("87%"));
    }
}
