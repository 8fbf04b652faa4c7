//! Audit records for evolution attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line replaced by an evolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedLine {
    /// 1-based line number in the original document
    pub line_number: usize,

    /// The line as it was before the evolution
    pub original: String,

    /// The replacement text
    pub evolved: String,
}

/// Immutable record of a single evolution, appended to the history log.
///
/// Records are never mutated or deleted once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionRecord {
    /// When the evolution was applied
    pub timestamp: DateTime<Utc>,

    /// Identifier of the evolved document
    pub document_id: String,

    /// Line count of the original document
    pub original_line_count: usize,

    /// Line count of the evolved document
    pub evolved_line_count: usize,

    /// The suggestion that was applied
    pub suggestion: String,

    /// Unified diff between original and evolved, one entry per line
    pub unified_diff: Vec<String>,

    /// Every line the evolution replaced
    pub changed_lines: Vec<ChangedLine>,

    /// The document's first title line, if any
    pub title: Option<String>,

    /// Non-blank, non-title lines in the original
    pub original_paragraph_count: usize,

    /// Non-blank, non-title lines in the evolved document
    pub evolved_paragraph_count: usize,
}

impl EvolutionRecord {
    /// 1-based numbers of the lines this evolution replaced.
    pub fn changed_line_numbers(&self) -> Vec<usize> {
        self.changed_lines.iter().map(|c| c.line_number).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EvolutionRecord {
        EvolutionRecord {
            timestamp: Utc::now(),
            document_id: "post-1".to_string(),
            original_line_count: 4,
            evolved_line_count: 4,
            suggestion: "Hello again!".to_string(),
            unified_diff: vec!["--- original".to_string(), "+++ evolved".to_string()],
            changed_lines: vec![ChangedLine {
                line_number: 2,
                original: "Hello world.".to_string(),
                evolved: "Hello again!".to_string(),
            }],
            title: Some("# My Blog".to_string()),
            original_paragraph_count: 2,
            evolved_paragraph_count: 2,
        }
    }

    #[test]
    fn test_changed_line_numbers() {
        assert_eq!(sample().changed_line_numbers(), vec![2]);
    }

    #[test]
    fn test_json_round_trip_fits_on_one_line() {
        let record = sample();
        let json = serde_json::to_string(&record).unwrap();
        // One self-contained record per history-log line
        assert!(!json.contains('\n'));

        let back: EvolutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
