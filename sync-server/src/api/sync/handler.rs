//! Replication API Handlers

use axum::{Json, extract::State};
use serde::Serialize;

use shared::error::AppResult;
use shared::models::{SyncCounters, WebhookCounters, WebhookEvent};

use crate::core::ServerState;
use crate::db::repository::{EventRepository, ProductRepository, SyncStatusRepository};
use crate::sync::SyncReport;

/// Events included with the status payload
const RECENT_EVENT_COUNT: i64 = 20;

/// POST /sync/initial - run the bulk replication path and return its report
pub async fn initial_sync(State(state): State<ServerState>) -> AppResult<Json<SyncReport>> {
    let report = state.engine.initial_sync().await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub counters: SyncCounters,
    pub webhooks: WebhookCounters,
    pub recent_events: Vec<WebhookEvent>,
}

/// GET /sync/status - cache and webhook counters plus the latest events
pub async fn status(State(state): State<ServerState>) -> AppResult<Json<StatusResponse>> {
    let products = ProductRepository::new(state.pool.clone());
    let statuses = SyncStatusRepository::new(state.pool.clone());
    let events = EventRepository::new(state.pool.clone());

    let (products_total, products_in_stock, variations_total, variations_in_stock) =
        products.counts().await?;
    let (synced, pending, errors) = statuses.counts().await?;

    Ok(Json(StatusResponse {
        counters: SyncCounters {
            products_total,
            products_in_stock,
            variations_total,
            variations_in_stock,
            synced,
            pending,
            errors,
        },
        webhooks: events.counts().await?,
        recent_events: events.recent(RECENT_EVENT_COUNT).await?,
    }))
}
