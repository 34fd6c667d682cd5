// src/evaluator/mod.rs — Heuristic rubric evaluator

pub mod feedback;

use serde_json::Value;

use crate::core::types::{EvaluationResult, Specification};
use crate::infra::errors::SpecError;
use crate::util::{char_len, round2};

pub const TITLE_POINTS: f64 = 0.35;
pub const DESCRIPTION_FULL_POINTS: f64 = 0.45;
pub const DESCRIPTION_SHORT_POINTS: f64 = 0.25;
pub const PRIORITY_POINTS: f64 = 0.20;

/// Descriptions shorter than this (trimmed, in characters) earn partial credit.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

pub const REMARK_TITLE: &str = "Add a concise Title.";
pub const REMARK_DESCRIPTION_SHORT: &str =
    "Expand the Description to at least 20 characters for clarity.";
pub const REMARK_DESCRIPTION_MISSING: &str = "Provide a Description.";
pub const REMARK_PRIORITY: &str = "Set priority to one of: high|medium|low.";
pub const COMMENT_ALL_GOOD: &str = "Spec looks good.";

/// Score an arbitrary JSON value. Fails with `TypeMismatch` unless it is an
/// object whose semantic fields are strings.
pub fn evaluate(value: &Value) -> Result<EvaluationResult, SpecError> {
    let spec = Specification::from_value(value)?;
    Ok(evaluate_spec(&spec))
}

/// Score a specification against the additive rubric.
pub fn evaluate_spec(spec: &Specification) -> EvaluationResult {
    let mut score = 0.0;
    let mut remarks: Vec<&str> = Vec::new();

    if spec.title.trim().is_empty() {
        remarks.push(REMARK_TITLE);
    } else {
        score += TITLE_POINTS;
    }

    let description = spec.description.trim();
    if char_len(description) >= MIN_DESCRIPTION_CHARS {
        score += DESCRIPTION_FULL_POINTS;
    } else if !description.is_empty() {
        score += DESCRIPTION_SHORT_POINTS;
        remarks.push(REMARK_DESCRIPTION_SHORT);
    } else {
        remarks.push(REMARK_DESCRIPTION_MISSING);
    }

    if spec.priority_level().is_some() {
        score += PRIORITY_POINTS;
    } else {
        remarks.push(REMARK_PRIORITY);
    }

    let comments = if remarks.is_empty() {
        COMMENT_ALL_GOOD.to_string()
    } else {
        remarks.join(" ")
    };

    EvaluationResult {
        score: round2(score).min(1.0),
        comments,
    }
}
