//! Error type and API response envelope

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error carried through handlers and the service layer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error condition
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// HTTP status code for this error.
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }
}

/// Unified API response envelope.
///
/// Success: `{"status": "success", "count": n?, "data": {...}}`
/// Failure: `{"status": "fail", "message": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `"success"` or `"fail"`
    pub status: String,
    /// Total match count for paginated list endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// Response payload (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Success response with data.
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            count: None,
            data: Some(data),
            message: None,
        }
    }

    /// Success response with a total count for paginated lists.
    pub fn with_count(count: i64, data: T) -> Self {
        Self {
            status: "success".to_string(),
            count: Some(count),
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success response without data.
    pub fn ok() -> Self {
        Self {
            status: "success".to_string(),
            count: None,
            data: None,
            message: None,
        }
    }

    /// Failure response from an error.
    pub fn fail(err: &AppError) -> Self {
        Self {
            status: "fail".to_string(),
            count: None,
            data: None,
            message: Some(err.message.clone()),
        }
    }
}

/// Result type alias for fallible operations returning [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        if self.code.is_system() {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }

        let status = self.http_status();
        let body = ApiResponse::fail(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_new_uses_default_message() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.message, "Order not found");
    }

    #[test]
    fn app_error_with_message() {
        let err = AppError::with_message(ErrorCode::ValidationFailed, "enter a user id");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "enter a user id");
    }

    #[test]
    fn app_error_http_status() {
        assert_eq!(
            AppError::not_found("Order").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::not_authenticated().http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::permission_denied("admin only").http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn app_error_display() {
        let err = AppError::with_message(ErrorCode::NotFound, "Order not found");
        assert_eq!(format!("{err}"), "Order not found");
    }

    #[test]
    fn success_envelope_serializes_without_message() {
        let response = ApiResponse::success(serde_json::json!({"points": 12}));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"success\""));
        assert!(json.contains("\"points\":12"));
        assert!(!json.contains("message"));
        assert!(!json.contains("count"));
    }

    #[test]
    fn count_envelope_carries_total() {
        let response = ApiResponse::with_count(57, vec![1, 2, 3]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"count\":57"));
    }

    #[test]
    fn fail_envelope_carries_message_only() {
        let err = AppError::validation("password is wrong");
        let response = ApiResponse::fail(&err);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"fail\""));
        assert!(json.contains("\"message\":\"password is wrong\""));
        assert!(!json.contains("data"));
    }
}
