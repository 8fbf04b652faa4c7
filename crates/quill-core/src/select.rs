//! Model selection from a prioritized candidate list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a generation backend model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Pick the first preferred model that the backend reports as available.
///
/// Deterministic and order-sensitive: the candidate list itself is the
/// tie-break. Returns `None` when no candidate is available.
pub fn select_model(preferred: &[ModelId], available: &[ModelId]) -> Option<ModelId> {
    preferred
        .iter()
        .find(|candidate| available.contains(candidate))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<ModelId> {
        items.iter().map(|s| ModelId::from(*s)).collect()
    }

    #[test]
    fn test_priority_order_wins() {
        let preferred = ids(&["best", "good", "okay"]);
        let available = ids(&["okay", "good"]);
        assert_eq!(
            select_model(&preferred, &available),
            Some(ModelId::from("good"))
        );
    }

    #[test]
    fn test_no_candidate_available() {
        let preferred = ids(&["best", "good"]);
        let available = ids(&["other"]);
        assert_eq!(select_model(&preferred, &available), None);

        assert_eq!(select_model(&preferred, &[]), None);
        assert_eq!(select_model(&[], &available), None);
    }

    #[test]
    fn test_available_order_is_irrelevant() {
        let preferred = ids(&["a", "b"]);
        assert_eq!(
            select_model(&preferred, &ids(&["b", "a"])),
            Some(ModelId::from("a"))
        );
    }
}
