//! Repository layer over the cache store
//!
//! One repository per table. Row structs mirror the SQLite schema and convert
//! into the shared model types; all timestamps are `i64` unix millis.

mod event;
mod product;
mod session;
mod sync_status;

pub use event::{EventRepository, NewEvent};
pub use product::ProductRepository;
pub use session::SessionRepository;
pub use sync_status::SyncStatusRepository;

use thiserror::Error;

/// Repository error
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for shared::error::AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(resource) => shared::error::AppError::not_found(resource),
            other => shared::error::AppError::database(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
