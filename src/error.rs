// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::validation::FieldError;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Every failure in the service collapses into one of these five kinds.
/// Store-layer causes ride along on `Conflict` for logging but never reach
/// the client.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request (malformed id, malformed body shape)
    BadRequest(String),

    // 401 Unauthorized - response body is uniform regardless of the reason;
    // the reason string is for server-side logs only
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (any unrecognized store-layer failure, duplicate keys included)
    Conflict {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // 422 Unprocessable Entity (field-constraint violations)
    Validation { errors: Vec<FieldError> },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::Validation { .. } => 422,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict { message, .. } => message,
            ApiError::Validation { .. } => "Validation failed",
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation { errors } => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code(),
                    "errors": errors,
                })
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code(),
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// The reason is kept for logs; clients always see the same denial.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        ApiError::Unauthorized(reason.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ApiError::Conflict {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::Validation { errors }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match &self {
            ApiError::Conflict { message, source } => {
                tracing::error!(%message, %source, "store-layer error collapsed to conflict");
            }
            ApiError::Unauthorized(reason) => {
                tracing::debug!(%reason, "request denied");
            }
            _ => {}
        }

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
