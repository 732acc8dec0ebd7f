//! Background tasks
//!
//! Long-lived loops owned by the server process, all tied to the shutdown
//! token.

use tokio::time::Duration;

use crate::core::ServerState;
use crate::db::repository::SessionRepository;

/// How often expired sessions are purged
const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

/// Spawn all background tasks
pub fn spawn(state: &ServerState) {
    let state = state.clone();
    tokio::spawn(async move {
        let shutdown = state.shutdown_token();
        let sessions = SessionRepository::new(state.pool.clone());
        let mut interval =
            tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));
        interval.tick().await; // skip immediate tick

        tracing::info!("Background tasks started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    match sessions.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => tracing::debug!(purged, "Expired sessions purged"),
                        Err(e) => tracing::warn!("Session purge failed: {e}"),
                    }
                }
            }
        }
        tracing::info!("Background tasks stopped");
    });
}
