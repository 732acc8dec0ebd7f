//! Feed API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use shared::error::{AppError, AppResult};

use crate::core::ServerState;
use crate::feeds::FeedReport;
use crate::sync::FeedStyle;

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    #[serde(default)]
    pub refresh: bool,
}

/// GET /catalog/generate?refresh=true|false - write both CSV artifacts
pub async fn generate(
    State(state): State<ServerState>,
    Query(params): Query<GenerateParams>,
) -> AppResult<Json<FeedReport>> {
    let report = state.feeds.generate_all(params.refresh).await?;
    Ok(Json(report))
}

/// GET /catalog/info - remote catalog metadata
pub async fn info(State(state): State<ServerState>) -> AppResult<Json<serde_json::Value>> {
    Ok(Json(state.meta.catalog_info().await?))
}

/// GET /catalog/batch/{handle} - poll one async batch handle
pub async fn batch_status(
    State(state): State<ServerState>,
    Path(handle): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    Ok(Json(state.meta.poll_handle(&handle).await?))
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub style: Option<String>,
}

/// GET /catalog?style=standard|christmas - stream one CSV inline
pub async fn download(
    State(state): State<ServerState>,
    Query(params): Query<DownloadParams>,
) -> AppResult<Response> {
    let style = match params.style.as_deref() {
        None => FeedStyle::Standard,
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::validation(format!("Unknown feed style: {raw}")))?,
    };

    let csv = state.feeds.render_style(style).await?;
    Ok((
        [(http::header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    )
        .into_response())
}
