//! Push-notification endpoint

pub mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/webhooks/woocommerce", post(handler::receive))
}
