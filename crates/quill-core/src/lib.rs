//! # quill-core
//!
//! Deterministic building blocks for the Quill content-evolution engine.
//!
//! This crate answers three questions about a proposed rewrite:
//! - Is the generated suggestion safe to apply?
//! - What does the document look like after applying it?
//! - What exactly changed, line by line?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces the same output
//! 2. **No I/O**: No network calls, no filesystem access
//! 3. **Non-destructive**: A [`Document`] is never mutated in place;
//!    every transform returns a fresh document plus an audit record
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_core::{apply_suggestion, DenylistValidator, Document};
//!
//! let doc = Document::new("post-1", vec![
//!     "# My Blog".to_string(),
//!     "Hello world.".to_string(),
//! ]);
//! let validator = DenylistValidator::default();
//! let (evolved, record) = apply_suggestion(&doc, "Hello again!", &validator)?;
//! assert_eq!(record.changed_line_numbers(), vec![2]);
//! ```

pub mod diff;
pub mod document;
pub mod record;
pub mod select;
pub mod transform;
pub mod validate;

// Re-export main types at crate root
pub use document::{is_title_line, Document, EvolutionDirection};
pub use record::{ChangedLine, EvolutionRecord};
pub use select::{select_model, ModelId};
pub use transform::apply;
pub use validate::{DenylistValidator, RejectReason, SuggestionValidator};

/// Validate a suggestion and, if it passes, apply it to a document.
///
/// This is the synchronous entry point for callers that already hold a
/// suggestion (e.g. an offline rewrite). A rejected suggestion never
/// reaches the transform; the original document is left untouched.
pub fn apply_suggestion(
    document: &Document,
    suggestion: &str,
    validator: &dyn SuggestionValidator,
) -> Result<(Document, EvolutionRecord), RejectReason> {
    validator.validate(suggestion)?;
    Ok(transform::apply(document, suggestion))
}
