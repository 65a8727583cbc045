//! Unified error system for the pharmalink backend
//!
//! - [`ErrorCode`]: standardized error codes with HTTP status mapping
//! - [`AppError`]: error type carried through handlers and services
//! - [`ApiResponse`]: the `{status, count?, data}` / `{status, message}`
//!   response envelope
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ApiResponse, ErrorCode};
//!
//! let err = AppError::not_found("Order");
//! assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);
//!
//! let ok = ApiResponse::success(42);
//! assert_eq!(ok.status, "success");
//! ```

mod codes;
mod types;

pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult};
