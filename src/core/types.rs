// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::infra::errors::SpecError;

/// A structured specification derived from a prompt.
///
/// The three semantic fields are always serialized. Any other key (for
/// example the `requirements` list added during iteration) is kept in
/// `extra` and round-trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Specification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority: priority.as_str().to_string(),
            extra: Map::new(),
        }
    }

    /// Interpret an arbitrary JSON value as a specification.
    ///
    /// Fails with `TypeMismatch` when the value is not an object or when one
    /// of the semantic fields holds something other than a string.
    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        if !value.is_object() {
            return Err(SpecError::TypeMismatch(format!(
                "json_spec must be an object, got {}",
                json_kind(value)
            )));
        }
        serde_json::from_value(value.clone()).map_err(|e| SpecError::TypeMismatch(e.to_string()))
    }

    /// The JSON object form, with `extra` keys inlined.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }

    pub fn has_priority(&self) -> bool {
        !self.priority.is_empty()
    }

    /// The priority, if it names one of the three levels.
    pub fn priority_level(&self) -> Option<Priority> {
        Priority::parse(&self.priority)
    }

    pub fn has_field(&self, key: &str) -> bool {
        match key {
            "title" => self.has_title(),
            "description" => self.has_description(),
            "priority" => self.has_priority(),
            other => self.extra.contains_key(other),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Exact (case-insensitive, trimmed) match against the three levels.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring a specification against the rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: f64,
    pub comments: String,
}

/// A discrete improvement directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suggestion {
    AddTitle,
    ExpandDescription,
    SetPriority,
    RefineWording,
    AddRequirements,
    RefineTechnicalDetails,
}

impl Suggestion {
    pub fn text(self) -> &'static str {
        match self {
            Suggestion::AddTitle => "Add a short, descriptive title (≤ 80 chars).",
            Suggestion::ExpandDescription => {
                "Expand the description with goals, inputs, and outputs (≥ 20 chars)."
            }
            Suggestion::SetPriority => "Set 'priority' to one of: high | medium | low.",
            Suggestion::RefineWording => {
                "Refine wording for clarity and add acceptance criteria if needed."
            }
            Suggestion::AddRequirements => {
                "Add structured requirements covering functional, performance and usability needs."
            }
            Suggestion::RefineTechnicalDetails => {
                "Refine technical and implementation details."
            }
        }
    }
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// A deduplicated set of suggestions that remembers insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSet {
    items: Vec<Suggestion>,
}

impl SuggestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suggestion. Returns false if it was already present.
    pub fn insert(&mut self, suggestion: Suggestion) -> bool {
        if self.items.contains(&suggestion) {
            return false;
        }
        self.items.push(suggestion);
        true
    }

    /// Set union, keeping the order of `self` first.
    pub fn union(mut self, other: &SuggestionSet) -> Self {
        for s in other.iter() {
            self.insert(s);
        }
        self
    }

    pub fn contains(&self, suggestion: Suggestion) -> bool {
        self.items.contains(&suggestion)
    }

    pub fn iter(&self) -> impl Iterator<Item = Suggestion> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn texts(&self) -> Vec<&'static str> {
        self.items.iter().map(|s| s.text()).collect()
    }

    /// Human-readable feedback line, suggestions joined with "; ".
    pub fn joined(&self) -> String {
        self.texts().join("; ")
    }
}

impl FromIterator<Suggestion> for SuggestionSet {
    fn from_iter<I: IntoIterator<Item = Suggestion>>(iter: I) -> Self {
        let mut set = SuggestionSet::new();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

/// One round of the iteration engine. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration_number: u32,
    pub before_json: Specification,
    pub after_json: Specification,
    pub score_before: f64,
    pub score_after: f64,
    pub feedback: String,
    #[serde(default)]
    pub comments_after: String,
}

/// Ordered, append-only list of iteration records.
pub type IterationHistory = Vec<IterationRecord>;
