//! GET /health — liveness probe.

use axum::Json;
use chrono::Utc;

pub const SERVICE_NAME: &str = "USSD Transport Service";

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}
