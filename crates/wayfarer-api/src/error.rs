//! API error types and JSON error response formatting.
//!
//! Every error body has the same shape: `{"error": code, "message": text}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use wayfarer_core::WayfarerError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "bad_request", "conflict").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or invalid parameters.
    BadRequest(String),
    /// 404 - resource does not exist.
    NotFound(String),
    /// 409 - a chat turn is already in flight for the session.
    Conflict(String),
    /// 429 - request rate exceeded.
    TooManyRequests(String),
    /// 500 - unexpected server error.
    Internal(String),
    /// 503 - a backing component is not ready.
    ServiceUnavailable(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, "too_many_requests"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Internal(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<WayfarerError> for ApiError {
    fn from(err: WayfarerError) -> Self {
        match err {
            WayfarerError::Config(msg) => ApiError::BadRequest(msg),
            WayfarerError::ShuttingDown => ApiError::ServiceUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::TooManyRequests("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err: ApiError = WayfarerError::Storage("disk full".into()).into();
        assert!(matches!(err, ApiError::Internal(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_config_error_is_bad_request() {
        let err: ApiError = WayfarerError::Config("bad port".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
