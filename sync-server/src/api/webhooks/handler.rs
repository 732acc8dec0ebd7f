//! Push-notification Handler

use axum::{Json, body::Bytes, extract::State};
use serde_json::json;

use shared::error::AppResult;

use crate::core::ServerState;
use crate::events::WebhookHeaders;

/// POST /webhooks/woocommerce
///
/// Validation failures answer 400/401/403 as appropriate; an accepted push
/// answers 200 immediately while the replication work runs on a background
/// task.
pub async fn receive(
    State(state): State<ServerState>,
    headers: http::HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let webhook_headers = WebhookHeaders::from_header_map(&headers);
    let event_id = state.processor.accept(webhook_headers, &body).await?;
    Ok(Json(json!({"received": true, "event_id": event_id})))
}
