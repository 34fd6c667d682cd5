// src/api/auth.rs

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::{types::ErrorResponse, ApiState};

/// Verify the bearer token if one is configured.
pub fn check_auth(
    expected: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing bearer token".into(),
            }),
        ))
    }
}

/// Middleware form of [`check_auth`] for the protected routes.
pub async fn require_token(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    match check_auth(state.token.as_deref(), request.headers()) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            tracing::warn!(path = %request.uri().path(), "Rejected unauthenticated request");
            rejection.into_response()
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks on token auth.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("authorization", value.parse().unwrap());
        h
    }

    #[test]
    fn test_no_token_configured_allows_all() {
        assert!(check_auth(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_matching_token() {
        assert!(check_auth(Some("s3cret"), &headers_with("Bearer s3cret")).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token() {
        let (status, _) = check_auth(Some("s3cret"), &headers_with("Bearer nope")).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(check_auth(Some("s3cret"), &HeaderMap::new()).is_err());
        assert!(check_auth(Some("s3cret"), &headers_with("s3cret")).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
