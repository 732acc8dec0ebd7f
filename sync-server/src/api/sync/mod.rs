//! Replication API

pub mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/sync/initial", post(handler::initial_sync))
        .route("/sync/status", get(handler::status))
}
