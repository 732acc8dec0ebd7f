//! HTTP routing and application construction
//!
//! Central place for route definitions and the middleware stack. Handlers
//! live one module per resource.

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod auth;
pub mod catalog;
pub mod health;
pub mod sync;
pub mod webhooks;

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All registered routes, no middleware and no state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Replication runs and counters - requires a session
        .merge(sync::router())
        // Feed generation and download
        .merge(catalog::router())
        // Push-notification ingestion - validated by signature, not session
        .merge(webhooks::router())
        // Session glue
        .merge(auth::router())
        // Health - public
        .merge(health::router())
}

/// The fully configured application with middleware
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        // CORS for the operator dashboard
        .layer(CorsLayer::permissive())
        // Gzip response compression
        .layer(CompressionLayer::new())
        // Request tracing
        .layer(TraceLayer::new_for_http())
        // Unique ID per request, propagated to the response
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        // Session check runs before routing; public paths skip it
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_session,
        ))
}
