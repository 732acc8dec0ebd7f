//! CSV feed generator
//!
//! Walks the cache and emits one CSV per style. Unlike the replication
//! engine, the feed emits variable parents as anchor rows; the feed consumer
//! understands them as grouping anchors.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use shared::catalog::CatalogItem;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Product, ProductKind, StockStatus};
use shared::util::now_millis;

use crate::db::repository::ProductRepository;
use crate::sync::mapper::{FeedStyle, MapperConfig, map_to_item};
use crate::sync::SyncEngine;

use super::columns;

/// Upper bound on mapper workers in the bulk feed path
const MAX_WORKERS: usize = 4;

/// Rows per worker below which extra workers stop paying off
const ROWS_PER_WORKER: usize = 10;

/// Result of one generate call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    pub paths: Vec<String>,
    pub rows: usize,
    pub refreshed: bool,
    pub elapsed_ms: i64,
}

/// One feed row: a product plus its optional parent context
#[derive(Clone)]
struct FeedRow {
    product: Product,
    parent: Option<Product>,
}

pub struct FeedGenerator {
    pool: SqlitePool,
    engine: Arc<SyncEngine>,
    mapper: MapperConfig,
    public_dir: String,
}

impl FeedGenerator {
    pub fn new(
        pool: SqlitePool,
        engine: Arc<SyncEngine>,
        mapper: MapperConfig,
        public_dir: String,
    ) -> Self {
        Self {
            pool,
            engine,
            mapper,
            public_dir,
        }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Generate both styles, writing the artifacts under the public
    /// directory. `refresh` re-reads the source store first; the fast path
    /// works from cache alone.
    pub async fn generate_all(&self, refresh: bool) -> AppResult<FeedReport> {
        let started = now_millis();

        if refresh {
            let cached = self.engine.refresh_cache().await?;
            tracing::info!(cached, "Feed cache refreshed from source");
        }

        let rows = self.collect_rows().await?;
        let row_count = rows.len();

        std::fs::create_dir_all(&self.public_dir)
            .map_err(|e| AppError::with_message(ErrorCode::FeedWriteFailed, e.to_string()))?;

        let mut paths = Vec::with_capacity(FeedStyle::ALL.len());
        for style in FeedStyle::ALL {
            let items = self.map_rows(rows.clone(), style).await?;
            let csv = columns::to_csv_string(&items)?;

            let path: PathBuf = std::path::Path::new(&self.public_dir)
                .join(format!("catalog_{}.csv", style.as_str()));
            std::fs::write(&path, csv)
                .map_err(|e| AppError::with_message(ErrorCode::FeedWriteFailed, e.to_string()))?;
            paths.push(path.to_string_lossy().into_owned());
        }

        let report = FeedReport {
            paths,
            rows: row_count,
            refreshed: refresh,
            elapsed_ms: now_millis() - started,
        };
        tracing::info!(
            rows = report.rows,
            refreshed = report.refreshed,
            elapsed_ms = report.elapsed_ms,
            "Feeds generated"
        );
        Ok(report)
    }

    /// Render one style straight from cache, for inline download
    pub async fn render_style(&self, style: FeedStyle) -> AppResult<String> {
        let rows = self.collect_rows().await?;
        let items = self.map_rows(rows, style).await?;
        columns::to_csv_string(&items)
    }

    /// Fast path: in-stock simple products, then variable parents as anchors
    /// followed by their in-stock cached variations
    async fn collect_rows(&self) -> AppResult<Vec<FeedRow>> {
        let products = self.products();
        let mut rows = Vec::new();

        for product in products.list_in_stock(ProductKind::Simple).await? {
            rows.push(FeedRow {
                product,
                parent: None,
            });
        }

        for parent in products.list_in_stock(ProductKind::Variable).await? {
            let variations = products.list_variations(parent.id).await?;
            let in_stock: Vec<Product> = variations
                .into_iter()
                .filter(Product::is_in_stock)
                .collect();

            // The anchor row advertises the children's aggregate stock
            let mut anchor = parent.clone();
            anchor.stock_quantity = Some(
                in_stock
                    .iter()
                    .filter_map(|v| v.stock_quantity)
                    .sum::<i64>(),
            );
            anchor.stock_status = if in_stock.is_empty() {
                StockStatus::OutOfStock
            } else {
                StockStatus::InStock
            };
            rows.push(FeedRow {
                product: anchor,
                parent: None,
            });

            for variation in in_stock {
                rows.push(FeedRow {
                    product: variation,
                    parent: Some(parent.clone()),
                });
            }
        }

        Ok(rows)
    }

    /// Map rows to items on a small blocking worker pool, preserving order
    async fn map_rows(&self, rows: Vec<FeedRow>, style: FeedStyle) -> AppResult<Vec<CatalogItem>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let workers = cpus
            .min(MAX_WORKERS)
            .min(rows.len().div_ceil(ROWS_PER_WORKER))
            .max(1);
        let chunk_size = rows.len().div_ceil(workers);

        let mut handles = Vec::with_capacity(workers);
        for chunk in rows.chunks(chunk_size) {
            let chunk = chunk.to_vec();
            let mapper = self.mapper.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|row| map_to_item(&row.product, row.parent.as_ref(), style, &mapper))
                    .collect::<Vec<_>>()
            }));
        }

        let mut items = Vec::with_capacity(rows.len());
        for handle in handles {
            let mapped = handle
                .await
                .map_err(|e| AppError::internal(format!("Feed mapper worker failed: {e}")))?;
            items.extend(mapped);
        }
        Ok(items)
    }
}
