// src/api/handlers.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::{types::*, ApiState};
use crate::core::engine::{validate_max_iters, IterationEngine, MAX_ITERS, MIN_ITERS};
use crate::core::extractor;
use crate::evaluator;
use crate::infra::errors::SpecError;
use crate::memory::store::{ReportDetail, ValueLogRow};
use crate::util::char_len;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Longest accepted value-journal entry, in characters.
const MAX_VALUE_CHARS: usize = 500;

/// How many value-journal entries `/hidg-logs` returns.
const RECENT_VALUE_LOGS: u32 = 30;

/// Translate a domain error into a status code and JSON body.
pub fn error_response(err: SpecError) -> ApiError {
    let status = match &err {
        SpecError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        SpecError::TypeMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SpecError::NotFound { .. } => StatusCode::NOT_FOUND,
        e if e.is_retriable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {err}");
    } else {
        tracing::warn!("Request rejected: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn validate_prompt(prompt: &str, max_chars: usize) -> Result<(), SpecError> {
    if prompt.trim().is_empty() {
        return Err(SpecError::invalid("prompt", "Prompt cannot be empty"));
    }
    if char_len(prompt) > max_chars {
        return Err(SpecError::invalid(
            "prompt",
            format!("Prompt exceeds {max_chars} characters"),
        ));
    }
    Ok(())
}

/// Narrow a requested round count, reporting the value exactly as sent.
fn parse_max_iters(requested: i64) -> Result<u32, SpecError> {
    match u32::try_from(requested) {
        Ok(n) => {
            validate_max_iters(n)?;
            Ok(n)
        }
        Err(_) => Err(SpecError::invalid(
            "max_iters",
            format!("must be between {MIN_ITERS} and {MAX_ITERS}, got {requested}"),
        )),
    }
}

fn validate_value(field: &str, value: &str) -> Result<(), SpecError> {
    let len = char_len(value);
    if len == 0 || len > MAX_VALUE_CHARS {
        return Err(SpecError::invalid(
            field,
            format!("must be between 1 and {MAX_VALUE_CHARS} characters"),
        ));
    }
    Ok(())
}

/// POST /generate — Prompt → JSON spec, persisted as a new report.
pub async fn generate(
    State(state): State<ApiState>,
    Json(body): Json<PromptRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    validate_prompt(&body.prompt, state.max_prompt_chars).map_err(error_response)?;
    let spec = extractor::extract(&body.prompt).map_err(error_response)?;

    let report = state
        .store
        .insert_report(body.prompt, spec)
        .await
        .map_err(|e| error_response(SpecError::store(e)))?;

    tracing::info!(report_id = %report.id, "Generated specification");
    Ok(Json(GenerateResponse {
        id: report.id,
        json_spec: report.json_spec,
    }))
}

/// POST /evaluate — Score a stored report's spec or an inline spec.
pub async fn evaluate(
    State(state): State<ApiState>,
    Json(body): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    // An empty report_id counts as absent
    let report_id = body.report_id.filter(|id| !id.is_empty());
    let result = match (report_id, body.json_spec) {
        (Some(report_id), _) => {
            let report = state
                .store
                .get_report(report_id.clone())
                .await
                .map_err(|e| error_response(SpecError::store(e)))?
                .ok_or_else(|| {
                    error_response(SpecError::NotFound {
                        what: "Report",
                        id: report_id.clone(),
                    })
                })?;

            let result = evaluator::evaluate(&report.json_spec).map_err(error_response)?;
            state
                .store
                .insert_evaluation(report_id, result.score, result.comments.clone())
                .await
                .map_err(|e| error_response(SpecError::store(e)))?;
            result
        }
        (None, Some(spec)) => evaluator::evaluate(&spec).map_err(error_response)?,
        (None, None) => {
            return Err(error_response(SpecError::invalid(
                "report_id",
                "Provide report_id or json_spec",
            )))
        }
    };

    Ok(Json(EvaluateResponse {
        score: result.score,
        comments: result.comments,
    }))
}

/// POST /iterate — Run the improvement loop and persist the full trail.
pub async fn iterate(
    State(state): State<ApiState>,
    Json(body): Json<IterateRequest>,
) -> Result<Json<IterateResponse>, ApiError> {
    validate_prompt(&body.prompt, state.max_prompt_chars).map_err(error_response)?;

    let requested = body.max_iters.unwrap_or(i64::from(state.default_max_iters));
    let max_iters = parse_max_iters(requested).map_err(error_response)?;

    let history = IterationEngine::new()
        .run(&body.prompt, max_iters)
        .map_err(error_response)?;
    let initial_spec = history
        .first()
        .map(|r| r.before_json.clone())
        .ok_or_else(|| error_response(SpecError::EmptyResult))?;

    let report = state
        .store
        .record_iteration_run(body.prompt, initial_spec, history.clone())
        .await
        .map_err(|e| error_response(SpecError::store(e)))?;

    tracing::info!(
        report_id = %report.id,
        iterations = history.len(),
        final_score = history.last().map(|r| r.score_after).unwrap_or_default(),
        "Iteration run persisted",
    );
    Ok(Json(IterateResponse {
        report_id: report.id,
        iterations: history,
    }))
}

/// GET /reports/{id} — Full report with nested history.
pub async fn get_report(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ReportDetail>, ApiError> {
    state
        .store
        .get_report_detail(id.clone())
        .await
        .map_err(|e| error_response(SpecError::store(e)))?
        .map(Json)
        .ok_or_else(|| error_response(SpecError::NotFound { what: "Report", id }))
}

/// DELETE /reports/{id} — Remove a report and everything under it.
pub async fn delete_report(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .store
        .delete_report(id.clone())
        .await
        .map_err(|e| error_response(SpecError::store(e)))?;

    if deleted {
        tracing::info!(report_id = %id, "Report deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(SpecError::NotFound { what: "Report", id }))
    }
}

/// POST /log-values — Store a daily values-journal entry.
pub async fn log_values(
    State(state): State<ApiState>,
    Json(body): Json<ValuesRequest>,
) -> Result<Json<IdResponse>, ApiError> {
    for (field, value) in [
        ("honesty", &body.honesty),
        ("integrity", &body.integrity),
        ("discipline", &body.discipline),
        ("gratitude", &body.gratitude),
    ] {
        validate_value(field, value).map_err(error_response)?;
    }

    let row = state
        .store
        .insert_value_log(body.honesty, body.integrity, body.discipline, body.gratitude)
        .await
        .map_err(|e| error_response(SpecError::store(e)))?;
    Ok(Json(IdResponse { id: row.id }))
}

/// GET /hidg-logs — Most recent value-journal entries, newest first.
pub async fn list_value_logs(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ValueLogRow>>, ApiError> {
    let rows = state
        .store
        .query_recent_value_logs(RECENT_VALUE_LOGS)
        .await
        .map_err(|e| error_response(SpecError::store(e)))?;
    Ok(Json(rows))
}

/// GET /health — Simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (SpecError::invalid("prompt", "empty"), StatusCode::BAD_REQUEST),
            (SpecError::TypeMismatch("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                SpecError::NotFound {
                    what: "Report",
                    id: "x".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (SpecError::store("down"), StatusCode::SERVICE_UNAVAILABLE),
            (
                SpecError::Database(rusqlite::Error::InvalidQuery),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (SpecError::EmptyResult, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, _) = error_response(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_validate_prompt_limits() {
        assert!(validate_prompt("ok", 10).is_ok());
        assert!(validate_prompt("   ", 10).is_err());
        assert!(validate_prompt(&"x".repeat(11), 10).is_err());
        assert!(validate_prompt(&"é".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_parse_max_iters_reports_requested_value() {
        assert_eq!(parse_max_iters(3).unwrap(), 3);
        for bad in [0, 11, -1, 5_000_000_000] {
            let err = parse_max_iters(bad).unwrap_err();
            assert!(matches!(err, SpecError::InvalidInput { .. }));
            assert!(err.to_string().ends_with(&format!("got {bad}")), "{err}");
        }
    }

    #[test]
    fn test_validate_value_limits() {
        assert!(validate_value("honesty", "told the truth").is_ok());
        assert!(validate_value("honesty", "").is_err());
        assert!(validate_value("honesty", &"x".repeat(501)).is_err());
    }
}
