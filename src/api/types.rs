// src/api/types.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::IterationRecord;

/// Request body for `/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub id: String,
    pub json_spec: Value,
}

/// Request body for `/evaluate`: a stored report or an inline spec.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub json_spec: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub score: f64,
    pub comments: String,
}

/// Request body for `/iterate`. `max_iters` falls back to the configured default.
#[derive(Debug, Clone, Deserialize)]
pub struct IterateRequest {
    pub prompt: String,
    #[serde(default)]
    pub max_iters: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct IterateResponse {
    pub report_id: String,
    pub iterations: Vec<IterationRecord>,
}

/// Daily honesty/integrity/discipline/gratitude entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ValuesRequest {
    pub honesty: String,
    pub integrity: String,
    pub discipline: String,
    pub gratitude: String,
}

#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
