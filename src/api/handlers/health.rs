use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::api::router::AppState;

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "submission_guard",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": state.clock.now().to_rfc3339(),
            "environment": state.rate_limiter.environment().to_string(),
            "rateLimitBackend": state.rate_limiter.active_backend(),
        })),
    )
}
