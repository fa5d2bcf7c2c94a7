//! Error types for the kiosk HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong admin credential (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Missing or wrong session access token (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - session already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Per-client rate limit exceeded (429)
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// QR generation failed (500, retryable)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// booth-common error
    #[error("Common error: {0}")]
    Common(#[from] booth_common::Error),
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        use booth_common::Error as CommonError;

        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", msg)
            }
            ApiError::Encoding(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENCODING_ERROR",
                msg,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Common(err) => match err {
                CommonError::NotFound(msg) => ApiError::NotFound(msg).parts(),
                CommonError::Conflict(msg) => ApiError::Conflict(msg).parts(),
                CommonError::InvalidInput(msg) => ApiError::BadRequest(msg).parts(),
                CommonError::Encoding(msg) => ApiError::Encoding(msg).parts(),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    other.to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_statuses() {
        let cases = [
            (booth_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (booth_common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (booth_common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (booth_common::Error::Encoding("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (booth_common::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_encoding_code() {
        let (_, code, _) = ApiError::from(booth_common::Error::Encoding("qr".into())).parts();
        assert_eq!(code, "ENCODING_ERROR");
    }
}
