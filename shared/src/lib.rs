//! Shared types for the pharmalink backend
//!
//! Domain models, status enums, the unified error type and the API
//! response envelope, consumed by `pharmalink-server`.

pub mod error;
pub mod models;
pub mod util;
