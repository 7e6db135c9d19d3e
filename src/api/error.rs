use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::EngineError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    RateLimited(u64),
    Validation(Vec<String>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
            ApiError::RateLimited(retry_after) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "rate limited", "retryAfterSecs": retry_after }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "valid": false, "errors": errors }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Maps the core's error taxonomy onto HTTP status codes. `venue_transient`
/// should never reach here — workers exhaust retries internally before
/// surfacing anything — but is treated as a 500 rather than panicking if it
/// somehow does.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::Validation(vec![msg]),
            EngineError::NotFound(msg) => ApiError::NotFound(msg),
            EngineError::VenueTransient { .. } => ApiError::Internal(err.to_string()),
            EngineError::VenuePermanent { .. }
            | EngineError::NoQuotes
            | EngineError::DeadlineExceeded
            | EngineError::SwapRejected(_) => ApiError::BadRequest(err.to_string()),
            EngineError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}
