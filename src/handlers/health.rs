use axum::{Json, response::IntoResponse};
use crate::server::SERVER_NAME;

// health handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVER_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
