//! Catalog sync server
//!
//! One-way replication of a WooCommerce store's in-stock products into a
//! Meta ad catalog, plus CSV feeds for out-of-band ingestion.
//!
//! # Module structure
//!
//! ```text
//! sync-server/src/
//! ├── core/      # Configuration, state, server lifecycle
//! ├── db/        # SQLite cache store and repositories
//! ├── clients/   # Source store and ad catalog HTTP clients
//! ├── sync/      # Retailer-id policy, item mapper, replication engine
//! ├── events/    # Webhook validation and async event processing
//! ├── feeds/     # CSV feed generation
//! ├── api/       # HTTP routes and handlers
//! ├── auth/      # Operator sessions
//! └── utils/     # Logging
//! ```

pub mod api;
pub mod auth;
pub mod clients;
pub mod core;
pub mod db;
pub mod events;
pub mod feeds;
pub mod sync;
pub mod utils;

// Re-export the public surface
pub use crate::core::{Config, Server, ServerState};
pub use crate::utils::logger::{init_logger, init_logger_with_file};
pub use crate::utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
