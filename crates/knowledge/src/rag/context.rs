//! Formatting retrieved passages for the prompt.

use crate::types::Passage;

/// Render passages as `[source]\ncontent` blocks separated by a blank line,
/// in retrieval order.
pub fn format_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| format!("[{}]\n{}", p.source(), p.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn passage(source: &str, content: &str) -> Passage {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), source.to_string());
        Passage {
            content: content.to_string(),
            metadata,
            score: 0.0,
        }
    }

    #[test]
    fn test_format_keeps_order() {
        let context = format_passages(&[
            passage("https://a.test", "First."),
            passage("notes.txt", "Second."),
        ]);
        assert_eq!(context, "[https://a.test]\nFirst.\n\n[notes.txt]\nSecond.");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_passages(&[]), "");
    }
}
