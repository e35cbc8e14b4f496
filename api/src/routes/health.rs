//! Health check endpoint.

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

/// Creates the health check routes.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Handler for GET /health
///
/// Returns a simple health status response.
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "tallyvane-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
