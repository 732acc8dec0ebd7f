//! Server Implementation
//!
//! HTTP server startup and lifecycle.

use tokio_util::sync::CancellationToken;

use shared::error::{AppError, AppResult};

use crate::api;
use crate::core::{Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    /// Create a server over already-initialized state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown_token()
    }

    /// Serve until the shutdown token fires
    ///
    /// No per-request idle deadline is configured: a bulk replication run
    /// holds its request open for minutes.
    pub async fn run(&self) -> AppResult<()> {
        self.state.start_background_tasks();

        let app = api::build_app(&self.state).with_state(self.state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!("Catalog sync server listening on {addr}");

        let shutdown = self.state.shutdown_token();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))
    }
}
