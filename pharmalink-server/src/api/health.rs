//! Health check

use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "success",
        "data": {
            "service": "pharmalink-server",
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}
