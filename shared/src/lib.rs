//! Shared types for the catalog replication service
//!
//! Used by the sync server, its tests, and the operator dashboard glue:
//!
//! - **models**: source-store products, sync bookkeeping, webhook events
//! - **catalog**: ad-catalog wire shapes (items, batch envelopes)
//! - **error**: unified error codes, [`error::AppError`], API responses

pub mod catalog;
pub mod error;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
