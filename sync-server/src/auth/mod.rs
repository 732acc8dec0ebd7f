//! Operator sessions
//!
//! Single env-configured account, DB-backed session tokens. Every non-public
//! request passes through [`require_session`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

use shared::error::{AppError, AppResult};
use shared::models::Session;
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::core::{Config, ServerState};
use crate::db::repository::SessionRepository;

/// Session lifetime
const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Session issuing and validation
pub struct SessionService {
    pool: SqlitePool,
    admin_username: String,
    admin_password: String,
}

impl SessionService {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            pool,
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
        }
    }

    fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.pool.clone())
    }

    /// Check the operator credentials and mint a session token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        // Fixed delay before any outcome is revealed
        tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

        if self.admin_password.is_empty() {
            return Err(AppError::config_missing("ADMIN_PASSWORD"));
        }

        let username_ok = username == self.admin_username;
        let password_ok = ring::constant_time::verify_slices_are_equal(
            password.as_bytes(),
            self.admin_password.as_bytes(),
        )
        .is_ok();
        if !username_ok || !password_ok {
            tracing::warn!(username, "Login failed - invalid credentials");
            return Err(AppError::invalid_credentials());
        }

        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = self
            .sessions()
            .insert(&token, now_millis() + SESSION_TTL_MS)
            .await?;
        tracing::info!("Operator logged in");
        Ok(session)
    }

    /// Resolve a token to a live session
    pub async fn validate(&self, token: &str) -> AppResult<Session> {
        let session = self
            .sessions()
            .find(token)
            .await?
            .ok_or_else(|| AppError::new(shared::ErrorCode::SessionInvalid))?;
        if session.is_expired(now_millis()) {
            self.sessions().delete(token).await?;
            return Err(AppError::session_expired());
        }
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> AppResult<bool> {
        Ok(self.sessions().delete(token).await?)
    }
}

/// Paths reachable without a session: login, health, webhook ingestion, and
/// the feed download the ad platform polls
fn is_public(path: &str, method: &http::Method) -> bool {
    path == "/auth/login"
        || path == "/health"
        || path.starts_with("/webhooks/")
        || (path == "/catalog" && method == http::Method::GET)
}

/// Extract the session token from a bearer header or the session cookie
fn extract_token(headers: &http::HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    headers
        .get(http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|cookie| cookie.strip_prefix("session="))
                .map(str::to_string)
        })
}

/// Require-session middleware
///
/// Validates the token and stores the [`Session`] in request extensions for
/// the handlers that need it.
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS preflight never carries credentials
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if is_public(req.uri().path(), req.method()) {
        return Ok(next.run(req).await);
    }

    let token = extract_token(req.headers()).ok_or_else(AppError::unauthorized)?;
    let session = state.sessions.validate(&token).await?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
