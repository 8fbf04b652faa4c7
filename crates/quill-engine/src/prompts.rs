//! Prompt construction for evolution requests.
//!
//! The backend is asked for a single replacement lead paragraph, not a
//! full rewrite: the transform only ever substitutes one line per title,
//! so anything more would be discarded.

use quill_core::{Document, EvolutionDirection};

/// Build the generation prompt for a document and direction.
pub fn build_prompt(document: &Document, direction: &EvolutionDirection) -> String {
    let mut prompt = String::new();

    prompt.push_str("Improve the following document by rewriting its lead paragraph.\n\n");
    prompt.push_str("Document:\n");
    prompt.push_str(&document.to_text());
    prompt.push_str("\n\n");

    if !direction.comment.trim().is_empty() {
        prompt.push_str("Direction from the author:\n");
        prompt.push_str(&direction.comment);
        prompt.push_str("\n\n");
    }

    if !direction.hints.is_empty() {
        prompt.push_str("Requested style:\n");
        for (key, value) in &direction.hints {
            prompt.push_str(&format!("- {key}: {value}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Respond with the replacement paragraph only, as a single line of plain text. \
         Do not repeat the title, do not add headings, and do not include code.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_document_and_direction() {
        let doc = Document::new("d1", vec!["# Title".into(), "Old lead.".into()]);
        let direction = EvolutionDirection::from_comment("more technical")
            .with_hint("tone", "professional");

        let prompt = build_prompt(&doc, &direction);
        assert!(prompt.contains("# Title"));
        assert!(prompt.contains("Old lead."));
        assert!(prompt.contains("more technical"));
        assert!(prompt.contains("- tone: professional"));
    }

    #[test]
    fn test_empty_direction_is_omitted() {
        let doc = Document::new("d1", vec!["# Title".into()]);
        let prompt = build_prompt(&doc, &EvolutionDirection::default());
        assert!(!prompt.contains("Direction from the author"));
        assert!(!prompt.contains("Requested style"));
    }
}
