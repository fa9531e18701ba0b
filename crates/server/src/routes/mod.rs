//! API route handlers
//!
//! - `health`: liveness, readiness, metrics and server metadata
//! - `lookup`: approximate book and customer lookups
//! - `catalog`: record inserts used to seed the in-memory store

pub mod catalog;
pub mod health;
pub mod lookup;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /, no authentication).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Bookstore Lookup Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/books/query",
            "/api/v1/customers/query",
            "/api/v1/books",
            "/api/v1/customers",
            "/api/v1/orders",
            "/api/v1/metadata",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
