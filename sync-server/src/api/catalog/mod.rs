//! Feed API

pub mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/catalog/generate", get(handler::generate))
        .route("/catalog/info", get(handler::info))
        .route("/catalog/batch/{handle}", get(handler::batch_status))
        .route("/catalog", get(handler::download))
}
