//! Session Handlers

use axum::{
    Extension, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use shared::error::{ApiResponse, AppResult};
use shared::models::Session;

use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
}

/// POST /auth/login - check credentials, mint a session, set the cookie
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state.sessions.login(&req.username, &req.password).await?;

    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400",
        session.token
    );
    Ok((
        AppendHeaders([(http::header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token: session.token,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /auth/logout - drop the current session
pub async fn logout(
    State(state): State<ServerState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.sessions.logout(&session.token).await?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /auth/check - report session validity
pub async fn check(Extension(session): Extension<Session>) -> Json<serde_json::Value> {
    Json(json!({
        "valid": true,
        "expires_at": session.expires_at,
    }))
}
