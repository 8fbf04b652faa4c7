//! Safety validation for generated suggestions.
//!
//! A suggestion must pass validation before it may be applied; a
//! rejected suggestion never reaches the transform. The denylist check
//! is substring matching and deliberately weak - it is specified
//! compatibility behavior, not a genuine security boundary.

use thiserror::Error;

/// Default maximum suggestion length, in characters.
pub const MAX_SUGGESTION_CHARS: usize = 1000;

/// Substrings that cause a suggestion to be rejected, matched
/// case-insensitively.
pub const FORBIDDEN_KEYWORDS: [&str; 5] = ["import", "exec", "eval", "os.", "sys."];

/// Why a suggestion was rejected.
///
/// Rules are checked in declaration order; the first failing rule
/// determines the reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("suggestion is empty or whitespace-only")]
    Empty,

    #[error("suggestion is {length} characters, maximum is {max}")]
    TooLong { length: usize, max: usize },

    #[error("suggestion contains forbidden keywords: {}", keywords.join(", "))]
    ForbiddenContent { keywords: Vec<String> },
}

/// Pluggable gate on untrusted generated content.
///
/// Implementations must be pure: the same suggestion always yields the
/// same verdict. Stricter policies (allow-lists, encoding checks) can be
/// substituted without touching the pipeline.
pub trait SuggestionValidator: Send + Sync {
    /// Judge whether a suggestion is acceptable to apply.
    fn validate(&self, suggestion: &str) -> Result<(), RejectReason>;
}

/// The default validator: non-empty, bounded length, keyword denylist.
#[derive(Debug, Clone)]
pub struct DenylistValidator {
    /// Maximum accepted length, in characters
    pub max_chars: usize,

    /// Lowercase substrings that cause rejection
    pub denylist: Vec<String>,
}

impl Default for DenylistValidator {
    fn default() -> Self {
        Self {
            max_chars: MAX_SUGGESTION_CHARS,
            denylist: FORBIDDEN_KEYWORDS.iter().map(|kw| kw.to_string()).collect(),
        }
    }
}

impl DenylistValidator {
    /// Create a validator with a custom length cap and denylist.
    pub fn new(max_chars: usize, denylist: Vec<String>) -> Self {
        Self {
            max_chars,
            denylist,
        }
    }
}

impl SuggestionValidator for DenylistValidator {
    fn validate(&self, suggestion: &str) -> Result<(), RejectReason> {
        if suggestion.trim().is_empty() {
            tracing::warn!("rejected empty suggestion");
            return Err(RejectReason::Empty);
        }

        let length = suggestion.chars().count();
        if length > self.max_chars {
            tracing::warn!(length, max = self.max_chars, "rejected over-length suggestion");
            return Err(RejectReason::TooLong {
                length,
                max: self.max_chars,
            });
        }

        let lowered = suggestion.to_lowercase();
        let keywords: Vec<String> = self
            .denylist
            .iter()
            .filter(|kw| lowered.contains(kw.as_str()))
            .cloned()
            .collect();
        if !keywords.is_empty() {
            tracing::warn!(keywords = ?keywords, "rejected suggestion with forbidden keywords");
            return Err(RejectReason::ForbiddenContent { keywords });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_empty() {
        let validator = DenylistValidator::default();
        assert_eq!(validator.validate("").unwrap_err(), RejectReason::Empty);
        assert_eq!(validator.validate("   \t").unwrap_err(), RejectReason::Empty);
    }

    #[test]
    fn test_rejects_over_length() {
        let validator = DenylistValidator::default();
        let long = "x".repeat(1001);
        assert_eq!(
            validator.validate(&long).unwrap_err(),
            RejectReason::TooLong {
                length: 1001,
                max: 1000
            }
        );

        // Exactly at the limit is fine
        let at_limit = "x".repeat(1000);
        assert!(validator.validate(&at_limit).is_ok());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let validator = DenylistValidator::default();
        // 1000 three-byte chars: within the char limit
        let wide = "あ".repeat(1000);
        assert!(validator.validate(&wide).is_ok());
    }

    #[test]
    fn test_rejects_forbidden_keywords() {
        let validator = DenylistValidator::default();
        let err = validator
            .validate("please import os and exec code")
            .unwrap_err();
        assert_eq!(
            err,
            RejectReason::ForbiddenContent {
                keywords: vec!["import".to_string(), "exec".to_string()],
            }
        );
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        let validator = DenylistValidator::default();
        let err = validator.validate("EVAL this").unwrap_err();
        assert_eq!(
            err,
            RejectReason::ForbiddenContent {
                keywords: vec!["eval".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_wins_over_other_rules() {
        // An empty suggestion is reported as Empty even with a tiny cap
        let validator = DenylistValidator::new(0, vec!["x".to_string()]);
        assert_eq!(validator.validate("  ").unwrap_err(), RejectReason::Empty);
    }

    #[test]
    fn test_accepts_ordinary_prose() {
        let validator = DenylistValidator::default();
        assert!(validator
            .validate("Hello world! Today was a great day.")
            .is_ok());
    }

    proptest! {
        #[test]
        fn prop_validation_is_deterministic(suggestion in ".{0,200}") {
            let validator = DenylistValidator::default();
            let first = validator.validate(&suggestion);
            let second = validator.validate(&suggestion);
            prop_assert_eq!(first, second);
        }
    }
}
