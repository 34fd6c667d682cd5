// src/evaluator/feedback.rs — Evaluation comments → improvement suggestions

use crate::core::types::{EvaluationResult, Specification, Suggestion, SuggestionSet};
use crate::util::char_len;

use super::MIN_DESCRIPTION_CHARS;

/// Map evaluator comments and the current spec to a set of suggestions.
///
/// Each rule is checked independently. When none fires, a single generic
/// refinement suggestion is returned so the set is never empty.
pub fn suggest(evaluation: &EvaluationResult, spec: &Specification) -> SuggestionSet {
    let comments = evaluation.comments.as_str();
    let mut set = SuggestionSet::new();

    if comments.contains("Title") && !spec.has_title() {
        set.insert(Suggestion::AddTitle);
    }
    if comments.contains("Description") && char_len(&spec.description) < MIN_DESCRIPTION_CHARS {
        set.insert(Suggestion::ExpandDescription);
    }
    if comments.to_lowercase().contains("priority") {
        set.insert(Suggestion::SetPriority);
    }
    if set.is_empty() {
        set.insert(Suggestion::RefineWording);
    }

    set
}
