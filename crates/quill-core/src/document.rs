//! Line-based document model.
//!
//! A document is an ordered sequence of text lines. A line whose trimmed
//! form starts with `#` is a title; the first non-blank line after a
//! title is its lead paragraph, the unit that evolution replaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returns true if the line is a title line (trimmed form starts with `#`).
pub fn is_title_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// An ordered sequence of text lines with a stable identifier.
///
/// Documents are owned by the caller. The engine never mutates one in
/// place; transforms always return a new `Document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, also used as the storage key
    pub id: String,

    /// The document content, one entry per line (no trailing newlines)
    pub lines: Vec<String>,
}

impl Document {
    /// Create a document from its lines.
    pub fn new(id: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            lines,
        }
    }

    /// Create a document by splitting raw text on `\n`.
    pub fn from_text(id: impl Into<String>, text: &str) -> Self {
        Self {
            id: id.into(),
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    /// Join the lines back into raw text.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// The first title line, untrimmed, if any.
    pub fn title(&self) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| is_title_line(line))
            .map(String::as_str)
    }

    /// Count of non-blank, non-title lines.
    pub fn paragraph_count(&self) -> usize {
        count_paragraphs(&self.lines)
    }
}

/// Count of non-blank, non-title lines in a line sequence.
pub(crate) fn count_paragraphs(lines: &[String]) -> usize {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty() && !is_title_line(line))
        .count()
}

/// Free-form instruction for the next evolution job.
///
/// The comment is the user's own words (e.g. "more technical"); hints
/// carry structured style/tone selections. Supplied per job and not
/// persisted as engine state beyond it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionDirection {
    /// Free-form instruction from the user
    #[serde(default)]
    pub comment: String,

    /// Structured hints, e.g. style -> formal, tone -> friendly
    #[serde(default)]
    pub hints: BTreeMap<String, String>,
}

impl EvolutionDirection {
    /// Create a direction from a free-form comment.
    pub fn from_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            hints: BTreeMap::new(),
        }
    }

    /// Add a style/tone hint.
    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_detection() {
        assert!(is_title_line("# Heading"));
        assert!(is_title_line("   ## Indented"));
        assert!(!is_title_line("plain text"));
        assert!(!is_title_line(""));
    }

    #[test]
    fn test_text_round_trip() {
        let doc = Document::from_text("d1", "# Title\nBody.\n\nMore.");
        assert_eq!(doc.lines.len(), 4);
        assert_eq!(doc.to_text(), "# Title\nBody.\n\nMore.");
    }

    #[test]
    fn test_title_is_first_title_line() {
        let doc = Document::new(
            "d1",
            vec!["intro".into(), "# First".into(), "# Second".into()],
        );
        assert_eq!(doc.title(), Some("# First"));

        let untitled = Document::new("d2", vec!["just text".into()]);
        assert_eq!(untitled.title(), None);
    }

    #[test]
    fn test_paragraph_count_skips_titles_and_blanks() {
        let doc = Document::new(
            "d1",
            vec![
                "# Title".into(),
                "one".into(),
                "".into(),
                "two".into(),
                "   ".into(),
            ],
        );
        assert_eq!(doc.paragraph_count(), 2);
    }

    #[test]
    fn test_direction_serde_round_trip() {
        let direction = EvolutionDirection::from_comment("more technical")
            .with_hint("style", "formal")
            .with_hint("tone", "professional");

        let json = serde_json::to_string(&direction).unwrap();
        let back: EvolutionDirection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, direction);
    }
}
