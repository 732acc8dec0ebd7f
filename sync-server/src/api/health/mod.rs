//! Health check API

use axum::{Json, Router, extract::State, routing::get};
use serde_json::json;

use crate::core::ServerState;
use shared::util::now_millis;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

/// GET /health - liveness and uptime
async fn health(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_ms": now_millis() - state.started_at,
    }))
}
