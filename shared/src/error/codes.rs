//! Error codes for the pharmalink backend
//!
//! Grouped by concern:
//! - general / validation
//! - authentication
//! - permission
//! - domain (orders, users, items, baskets)
//! - system

use http::StatusCode;
use std::fmt;

/// Closed set of error conditions the API can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ==================== General ====================
    /// Unknown error
    Unknown,
    /// Validation failed
    ValidationFailed,
    /// Resource not found
    NotFound,
    /// Resource already exists
    AlreadyExists,
    /// Invalid request
    InvalidRequest,

    // ==================== Auth ====================
    /// Caller is not authenticated
    NotAuthenticated,
    /// Token has expired
    TokenExpired,
    /// Token is invalid
    TokenInvalid,

    // ==================== Permission ====================
    /// Permission denied
    PermissionDenied,
    /// Admin role required
    AdminRequired,

    // ==================== Domain ====================
    /// Order not found
    OrderNotFound,
    /// User not found
    UserNotFound,
    /// Item not found
    ItemNotFound,
    /// Basket not found
    BasketNotFound,
    /// User still referenced by live records (items/orders/baskets)
    UserHasLinkedRecords,

    // ==================== System ====================
    /// Internal server error
    InternalError,
    /// Database error
    DatabaseError,
}

impl ErrorCode {
    /// HTTP status code for this error condition.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::BAD_REQUEST,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,

            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::AdminRequired => StatusCode::FORBIDDEN,

            Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::ItemNotFound => StatusCode::NOT_FOUND,
            Self::BasketNotFound => StatusCode::NOT_FOUND,
            Self::UserHasLinkedRecords => StatusCode::BAD_REQUEST,

            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Default human-readable message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::NotAuthenticated => "Authentication required",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",

            Self::PermissionDenied => "Permission denied",
            Self::AdminRequired => "Admin role required",

            Self::OrderNotFound => "Order not found",
            Self::UserNotFound => "User not found",
            Self::ItemNotFound => "Item not found",
            Self::BasketNotFound => "Basket not found",
            Self::UserHasLinkedRecords => "User has linked records and cannot be deleted",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }

    /// True for conditions that indicate a server-side fault worth logging.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::InternalError | Self::DatabaseError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_taxonomy() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn system_codes_flagged() {
        assert!(ErrorCode::DatabaseError.is_system());
        assert!(!ErrorCode::OrderNotFound.is_system());
    }
}
