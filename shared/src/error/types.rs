//! Error type and JSON error envelope

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error with structured error code
///
/// The message is what the browser sees for non-system errors. System
/// errors keep the detailed message for the log only.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a required-field error
    pub fn required(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::RequiredField, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Message that is safe to put on the wire
    pub fn public_message(&self) -> &str {
        if matches!(self.code.category(), ErrorCategory::System) {
            self.code.message()
        } else {
            &self.message
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// JSON error envelope: `{ "success": false, "code": 4002, "error": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: u16,
    pub error: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            code: err.code.code(),
            error: err.public_message().to_string(),
        }
    }
}

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        if matches!(self.code.category(), ErrorCategory::System) {
            tracing::error!(
                code = %self.code,
                message = %self.message,
                "System error occurred"
            );
        }

        let status = self.http_status();
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::CardNotFound);
        assert_eq!(err.code, ErrorCode::CardNotFound);
        assert_eq!(err.message, "Client not found");
    }

    #[test]
    fn test_convenience_constructors() {
        let err = AppError::not_found("Client 7");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Client 7 not found");

        assert_eq!(AppError::required("UID is required").code, ErrorCode::RequiredField);
        assert_eq!(AppError::conflict("dup").http_status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::invalid_credentials().http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn system_errors_hide_details_on_the_wire() {
        let err = AppError::database("UNIQUE constraint failed: visit.member_id");
        let body = ErrorBody::from(&err);
        assert!(!body.success);
        assert_eq!(body.code, 9002);
        assert_eq!(body.error, "Database error");
        assert_eq!(err.to_string(), "UNIQUE constraint failed: visit.member_id");
    }

    #[test]
    fn client_errors_keep_message() {
        let body = ErrorBody::from(&AppError::required("UID is required"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "UID is required");
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], 7);
    }
}
