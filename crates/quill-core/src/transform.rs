//! Title-aware paragraph replacement.
//!
//! The transform replaces the first non-blank line after each title line
//! with the suggestion. A document with several titles (sectioned
//! content) gets exactly one replacement per title; a document with no
//! title, or no paragraph after a title, comes back unchanged - that is
//! specified behavior, not an error.

use chrono::Utc;

use crate::diff;
use crate::document::{count_paragraphs, is_title_line, Document};
use crate::record::{ChangedLine, EvolutionRecord};

/// Apply a suggestion to a document.
///
/// Returns the evolved document (the input is never mutated) and an
/// [`EvolutionRecord`] describing what changed, including a unified diff
/// that reproduces `evolved` when applied to `original`.
pub fn apply(original: &Document, suggestion: &str) -> (Document, EvolutionRecord) {
    let mut evolved_lines = Vec::with_capacity(original.lines.len());
    let mut title_seen = false;
    let mut changed_lines = Vec::new();

    for (i, line) in original.lines.iter().enumerate() {
        if is_title_line(line) {
            evolved_lines.push(line.clone());
            title_seen = true;
        } else if title_seen && !line.trim().is_empty() {
            // Lead paragraph: replace the entire line with the suggestion
            evolved_lines.push(suggestion.to_string());
            changed_lines.push(ChangedLine {
                line_number: i + 1,
                original: line.clone(),
                evolved: suggestion.to_string(),
            });
            title_seen = false;
        } else {
            evolved_lines.push(line.clone());
        }
    }

    let unified_diff = diff::unified(&original.lines, &evolved_lines);

    let record = EvolutionRecord {
        timestamp: Utc::now(),
        document_id: original.id.clone(),
        original_line_count: original.lines.len(),
        evolved_line_count: evolved_lines.len(),
        suggestion: suggestion.to_string(),
        unified_diff,
        changed_lines,
        title: original.title().map(str::to_string),
        original_paragraph_count: original.paragraph_count(),
        evolved_paragraph_count: count_paragraphs(&evolved_lines),
    };

    tracing::info!(
        document_id = %original.id,
        changed = record.changed_lines.len(),
        "applied evolution suggestion"
    );

    let evolved = Document::new(original.id.clone(), evolved_lines);
    (evolved, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::patch;

    fn doc(lines: &[&str]) -> Document {
        Document::new("test", lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_end_to_end_scenario() {
        let original = doc(&["# My Blog", "Hello world.", "", "More text."]);
        let suggestion = "Hello world! Today was a great day.";

        let (evolved, record) = apply(&original, suggestion);

        assert_eq!(
            evolved.lines,
            vec![
                "# My Blog",
                "Hello world! Today was a great day.",
                "",
                "More text."
            ]
        );
        assert_eq!(record.changed_line_numbers(), vec![2]);
        assert_eq!(record.original_paragraph_count, 2);
        assert_eq!(record.evolved_paragraph_count, 2);
        assert_eq!(record.title.as_deref(), Some("# My Blog"));
        assert_eq!(record.original_line_count, 4);
        assert_eq!(record.evolved_line_count, 4);
    }

    #[test]
    fn test_input_document_is_untouched() {
        let original = doc(&["# T", "body"]);
        let before = original.clone();
        let _ = apply(&original, "replacement");
        assert_eq!(original, before);
    }

    #[test]
    fn test_each_title_gets_one_replacement() {
        let original = doc(&[
            "# Section one",
            "first lead",
            "first tail",
            "# Section two",
            "second lead",
        ]);
        let (evolved, record) = apply(&original, "NEW");

        assert_eq!(
            evolved.lines,
            vec!["# Section one", "NEW", "first tail", "# Section two", "NEW"]
        );
        assert_eq!(record.changed_line_numbers(), vec![2, 5]);
    }

    #[test]
    fn test_blank_lines_after_title_are_skipped() {
        let original = doc(&["# T", "", "lead after blank"]);
        let (evolved, record) = apply(&original, "NEW");

        assert_eq!(evolved.lines, vec!["# T", "", "NEW"]);
        assert_eq!(record.changed_line_numbers(), vec![3]);
    }

    #[test]
    fn test_no_title_means_no_change() {
        let original = doc(&["just text", "more text"]);
        let (evolved, record) = apply(&original, "NEW");

        assert_eq!(evolved.lines, original.lines);
        assert!(record.changed_lines.is_empty());
        assert!(record.unified_diff.is_empty());
        assert_eq!(record.title, None);
    }

    #[test]
    fn test_title_with_no_following_paragraph() {
        let original = doc(&["body first", "# Trailing title"]);
        let (evolved, record) = apply(&original, "NEW");

        assert_eq!(evolved.lines, original.lines);
        assert!(record.changed_lines.is_empty());
    }

    #[test]
    fn test_title_lines_are_byte_identical() {
        let original = doc(&["  ## spaced title  ", "lead"]);
        let (evolved, _) = apply(&original, "NEW");
        assert_eq!(evolved.lines[0], "  ## spaced title  ");
    }

    #[test]
    fn test_recorded_diff_reproduces_evolved() {
        let original = doc(&["# A", "lead a", "", "# B", "lead b", "tail"]);
        let (evolved, record) = apply(&original, "rewritten");

        assert_eq!(
            patch(&original.lines, &record.unified_diff),
            Some(evolved.lines)
        );
    }
}
