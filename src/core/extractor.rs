// src/core/extractor.rs — Free text → Specification

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Priority, Specification};
use crate::infra::errors::SpecError;
use crate::util::truncate_chars;

/// Longest synthesized title, in characters.
pub const TITLE_MAX_CHARS: usize = 80;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("title"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("description"));
static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("priority"));

/// Whole-word priority vocabulary, checked in order.
static PRIORITY_WORDS: LazyLock<Vec<(Regex, Priority)>> = LazyLock::new(|| {
    [
        ("high", Priority::High),
        ("urgent", Priority::High),
        ("critical", Priority::High),
        ("medium", Priority::Medium),
        ("normal", Priority::Medium),
        ("low", Priority::Low),
        ("minor", Priority::Low),
    ]
    .into_iter()
    .map(|(word, level)| (word_regex(word), level))
    .collect()
});

/// `key<sep>value` where sep is `:`, `=` or `-` and the value runs to the
/// next `;`, newline or end of text.
fn field_regex(key: &str) -> Regex {
    Regex::new(&format!(r"(?is){key}\s*[:=-]\s*(.+?)(?:;|\n|$)"))
        .unwrap_or_else(|e| panic!("invalid field pattern for {key}: {e}"))
}

fn word_regex(word: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
        .unwrap_or_else(|e| panic!("invalid word pattern for {word}: {e}"))
}

fn extract_field(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Infer priority from an explicit `priority:` field, falling back to
/// vocabulary words anywhere in the text.
pub fn infer_priority(text: &str) -> Priority {
    if let Some(explicit) = extract_field(&PRIORITY_RE, text) {
        let p = explicit.to_lowercase();
        return if p.contains("high") {
            Priority::High
        } else if p.contains("med") {
            Priority::Medium
        } else if p.contains("low") {
            Priority::Low
        } else {
            Priority::Medium
        };
    }

    PRIORITY_WORDS
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, level)| *level)
        .unwrap_or_default()
}

/// Turn a raw prompt into a three-field specification.
pub fn extract(raw_text: &str) -> Result<Specification, SpecError> {
    let trimmed = raw_text.trim();
    if trimmed.is_empty() {
        return Err(SpecError::invalid("prompt", "Prompt cannot be empty"));
    }

    let title = extract_field(&TITLE_RE, raw_text);
    let description = extract_field(&DESCRIPTION_RE, raw_text);

    let (title, description) = match (title, description) {
        (Some(t), Some(d)) => (t, d),
        (Some(t), None) => (t.clone(), t),
        (None, Some(d)) => {
            // A leading "." (".NET ...") leaves no first sentence; use the whole field
            let first_sentence = d.split('.').next().unwrap_or_default().trim();
            let source = if first_sentence.is_empty() {
                d.as_str()
            } else {
                first_sentence
            };
            (truncate_chars(source, TITLE_MAX_CHARS).to_string(), d)
        }
        (None, None) => (
            truncate_chars(trimmed, TITLE_MAX_CHARS).to_string(),
            trimmed.to_string(),
        ),
    };

    let priority = infer_priority(raw_text);
    tracing::debug!(%priority, title_chars = title.chars().count(), "Extracted specification");

    Ok(Specification::new(title, description, priority))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_all_fields() {
        let spec = extract("Title: X; Description: Y; Priority: high").unwrap();
        assert_eq!(spec, Specification::new("X", "Y", Priority::High));
    }

    #[test]
    fn test_extract_empty_is_invalid() {
        assert!(matches!(
            extract(""),
            Err(SpecError::InvalidInput { .. })
        ));
        assert!(matches!(
            extract("   \n\t"),
            Err(SpecError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_extract_free_text_uses_whole_prompt() {
        let spec = extract("  design a robot using aluminium  ").unwrap();
        assert_eq!(spec.title, "design a robot using aluminium");
        assert_eq!(spec.description, "design a robot using aluminium");
        assert_eq!(spec.priority, "medium");
    }

    #[test]
    fn test_extract_free_text_title_capped_at_80_chars() {
        let prompt = "a".repeat(120);
        let spec = extract(&prompt).unwrap();
        assert_eq!(spec.title.chars().count(), 80);
        assert_eq!(spec.description.chars().count(), 120);
    }

    #[test]
    fn test_extract_description_only_synthesizes_title() {
        let spec =
            extract("description: Build a portal. It manages courses and grades").unwrap();
        assert_eq!(spec.title, "Build a portal");
        assert_eq!(
            spec.description,
            "Build a portal. It manages courses and grades"
        );
    }

    #[test]
    fn test_extract_leading_dot_description_keeps_title() {
        let spec = extract("description: .NET service migration to containers").unwrap();
        assert_eq!(spec.title, ".NET service migration to containers");
        assert_eq!(spec.description, ".NET service migration to containers");

        let spec = extract("description: ...").unwrap();
        assert!(!spec.title.is_empty());
    }

    #[test]
    fn test_extract_title_only_copies_to_description() {
        let spec = extract("Title = Student Portal").unwrap();
        assert_eq!(spec.title, "Student Portal");
        assert_eq!(spec.description, "Student Portal");
    }

    #[test]
    fn test_extract_separators_and_case() {
        let spec = extract("TITLE - Inventory\nDESCRIPTION= Track stock levels per warehouse").unwrap();
        assert_eq!(spec.title, "Inventory");
        assert_eq!(spec.description, "Track stock levels per warehouse");
    }

    #[test]
    fn test_explicit_priority_substrings() {
        assert_eq!(infer_priority("priority: very HIGH"), Priority::High);
        assert_eq!(infer_priority("priority: med"), Priority::Medium);
        assert_eq!(infer_priority("priority = lowest"), Priority::Low);
        assert_eq!(infer_priority("priority: whenever"), Priority::Medium);
    }

    #[test]
    fn test_vocabulary_priority_whole_words() {
        assert_eq!(infer_priority("this is urgent"), Priority::High);
        assert_eq!(infer_priority("a minor tweak"), Priority::Low);
        assert_eq!(infer_priority("normal stuff"), Priority::Medium);
        // "highway" and "lower" are not whole-word matches
        assert_eq!(infer_priority("build a highway lower bound"), Priority::Medium);
    }

    #[test]
    fn test_vocabulary_order_wins_over_text_order() {
        // "low" appears first in the text, but "critical" is earlier in the vocabulary
        assert_eq!(infer_priority("low effort but critical"), Priority::High);
    }

    #[test]
    fn test_default_priority_is_medium() {
        assert_eq!(infer_priority("paint the fence"), Priority::Medium);
    }

    #[test]
    fn test_priority_key_in_free_text_prompt() {
        let spec = extract("design a robot using aluminium; Priority: high").unwrap();
        assert_eq!(spec.priority, "high");
    }
}
