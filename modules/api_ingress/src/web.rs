use axum::response::Json;
use serde_json::{json, Value};

/// Liveness probe; never requires credentials.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
