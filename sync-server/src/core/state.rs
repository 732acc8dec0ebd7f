//! Server state - shared handles to every service

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use shared::error::AppResult;
use shared::util::now_millis;

use crate::auth::SessionService;
use crate::clients::{MetaCatalogClient, WooClient};
use crate::core::Config;
use crate::db::DbService;
use crate::events::{EventProcessor, ProductLocks};
use crate::feeds::FeedGenerator;
use crate::sync::{MapperConfig, SyncEngine};

/// Shared server state
///
/// Cloned per request; every service is behind an `Arc`, so clones are
/// shallow.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// SQLite cache store
    pub pool: SqlitePool,
    /// Source store client
    pub woo: Arc<WooClient>,
    /// Ad catalog client
    pub meta: Arc<MetaCatalogClient>,
    /// Replication engine
    pub engine: Arc<SyncEngine>,
    /// CSV feed generator
    pub feeds: Arc<FeedGenerator>,
    /// Operator sessions
    pub sessions: Arc<SessionService>,
    /// Push-notification processor
    pub processor: EventProcessor,
    /// Server start time (unix millis)
    pub started_at: i64,
    shutdown: CancellationToken,
}

impl ServerState {
    /// Open the cache store and wire every service together
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.db_path).await?;
        let pool = db.pool;

        let woo = Arc::new(WooClient::new(config));
        let meta = Arc::new(MetaCatalogClient::new(config));
        let mapper = MapperConfig::from(config);

        let engine = Arc::new(SyncEngine::new(
            pool.clone(),
            woo.clone(),
            meta.clone(),
            mapper.clone(),
        ));
        let feeds = Arc::new(FeedGenerator::new(
            pool.clone(),
            engine.clone(),
            mapper,
            config.public_dir.clone(),
        ));
        let sessions = Arc::new(SessionService::new(pool.clone(), config));
        let processor = EventProcessor::new(
            pool.clone(),
            engine.clone(),
            woo.clone(),
            meta.clone(),
            Arc::new(ProductLocks::new()),
            config.webhook_secret.clone(),
            config.source_host(),
        );

        Ok(Self {
            config: config.clone(),
            pool,
            woo,
            meta,
            engine,
            feeds,
            sessions,
            processor,
            started_at: now_millis(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the long-lived background tasks
    pub fn start_background_tasks(&self) {
        crate::core::tasks::spawn(self);
    }
}
