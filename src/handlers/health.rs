use axum::Json;
use serde_json::Value;

// GET /health
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
