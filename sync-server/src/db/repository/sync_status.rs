//! Sync-Status Repository
//!
//! One row per replicable id. Rows are created the first time an id is
//! presented to the replication engine and cascade-deleted with their
//! backing product.

use super::{RepoResult, RepoError};
use shared::models::{SyncState, SyncStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// SQLite row for sync_status
#[derive(Debug, Clone, sqlx::FromRow)]
struct SyncStatusRow {
    id: i64,
    product_id: i64,
    retailer_id: String,
    sync_state: String,
    exists_remotely: i64,
    last_availability: Option<String>,
    last_inventory: Option<i64>,
    last_synced_at: Option<i64>,
    last_error: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl SyncStatusRow {
    fn into_status(self) -> SyncStatus {
        SyncStatus {
            id: self.id,
            product_id: self.product_id,
            retailer_id: self.retailer_id,
            sync_state: self.sync_state.parse().unwrap_or(SyncState::Pending),
            exists_remotely: self.exists_remotely != 0,
            last_availability: self.last_availability,
            last_inventory: self.last_inventory,
            last_synced_at: self.last_synced_at,
            last_error: self.last_error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct SyncStatusRepository {
    pool: SqlitePool,
}

impl SyncStatusRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a replicable id, keeping existing state on re-presentation
    ///
    /// `product_id` is the backing products-table row: the parent's id for a
    /// variation, the product's own id otherwise.
    pub async fn present(&self, product_id: i64, retailer_id: &str) -> RepoResult<()> {
        let now = now_millis();
        sqlx::query(
            r#"
            INSERT INTO sync_status (product_id, retailer_id, sync_state, created_at, updated_at)
            VALUES (?, ?, 'pending', ?, ?)
            ON CONFLICT(retailer_id) DO UPDATE SET
                product_id = excluded.product_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(retailer_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark an id as synced, stamping the observed availability and inventory
    pub async fn mark_synced(
        &self,
        retailer_id: &str,
        availability: &str,
        inventory: Option<i64>,
    ) -> RepoResult<()> {
        let now = now_millis();
        sqlx::query(
            r#"
            UPDATE sync_status SET
                sync_state = 'synced',
                exists_remotely = 1,
                last_availability = ?,
                last_inventory = ?,
                last_synced_at = ?,
                last_error = NULL,
                updated_at = ?
            WHERE retailer_id = ?
            "#,
        )
        .bind(availability)
        .bind(inventory)
        .bind(now)
        .bind(now)
        .bind(retailer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark an id as errored, preserving the last observed stock data
    pub async fn mark_error(&self, retailer_id: &str, error: &str) -> RepoResult<()> {
        let now = now_millis();
        sqlx::query(
            "UPDATE sync_status SET sync_state = 'error', last_error = ?, updated_at = ? WHERE retailer_id = ?",
        )
        .bind(error)
        .bind(now)
        .bind(retailer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Latch the remote-existence flag
    pub async fn set_exists_remotely(&self, retailer_id: &str, exists: bool) -> RepoResult<()> {
        let now = now_millis();
        sqlx::query("UPDATE sync_status SET exists_remotely = ?, updated_at = ? WHERE retailer_id = ?")
            .bind(exists as i64)
            .bind(now)
            .bind(retailer_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find(&self, retailer_id: &str) -> RepoResult<Option<SyncStatus>> {
        let row: Option<SyncStatusRow> =
            sqlx::query_as("SELECT * FROM sync_status WHERE retailer_id = ?")
                .bind(retailer_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(SyncStatusRow::into_status))
    }

    pub async fn get(&self, retailer_id: &str) -> RepoResult<SyncStatus> {
        self.find(retailer_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("sync_status {retailer_id}")))
    }

    /// Remove one row; used when a variation is deleted without its parent
    pub async fn delete(&self, retailer_id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM sync_status WHERE retailer_id = ?")
            .bind(retailer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// (synced, pending, error) counts
    pub async fn counts(&self) -> RepoResult<(i64, i64, i64)> {
        let mut synced = 0;
        let mut pending = 0;
        let mut errors = 0;
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT sync_state, COUNT(*) FROM sync_status GROUP BY sync_state")
                .fetch_all(&self.pool)
                .await?;
        for (state, count) in rows {
            match state.as_str() {
                "synced" => synced = count,
                "error" => errors = count,
                _ => pending = count,
            }
        }
        Ok((synced, pending, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::repository::ProductRepository;
    use shared::models::{Product, ProductKind, StockStatus};

    async fn seed_product(pool: &SqlitePool, id: i64) {
        let repo = ProductRepository::new(pool.clone());
        let product = Product {
            id,
            kind: ProductKind::Simple,
            stock_status: StockStatus::InStock,
            ..Default::default()
        };
        repo.upsert(&product, &format!("wc_{id}")).await.unwrap();
    }

    #[tokio::test]
    async fn test_present_keeps_state() {
        let pool = memory_pool().await.unwrap();
        seed_product(&pool, 42).await;
        let repo = SyncStatusRepository::new(pool);

        repo.present(42, "wc_42").await.unwrap();
        repo.mark_synced("wc_42", "in stock", Some(7)).await.unwrap();

        // Re-presenting must not reset the synced state
        repo.present(42, "wc_42").await.unwrap();
        let status = repo.get("wc_42").await.unwrap();
        assert_eq!(status.sync_state, SyncState::Synced);
        assert!(status.exists_remotely);
        assert_eq!(status.last_availability.as_deref(), Some("in stock"));
        assert_eq!(status.last_inventory, Some(7));
    }

    #[tokio::test]
    async fn test_error_then_synced_clears_error() {
        let pool = memory_pool().await.unwrap();
        seed_product(&pool, 42).await;
        let repo = SyncStatusRepository::new(pool);

        repo.present(42, "wc_42").await.unwrap();
        repo.mark_error("wc_42", "boom").await.unwrap();
        let status = repo.get("wc_42").await.unwrap();
        assert_eq!(status.sync_state, SyncState::Error);
        assert_eq!(status.last_error.as_deref(), Some("boom"));

        repo.mark_synced("wc_42", "in stock", Some(1)).await.unwrap();
        let status = repo.get("wc_42").await.unwrap();
        assert_eq!(status.sync_state, SyncState::Synced);
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_cascade_with_product() {
        let pool = memory_pool().await.unwrap();
        seed_product(&pool, 42).await;
        let status_repo = SyncStatusRepository::new(pool.clone());
        status_repo.present(42, "wc_42").await.unwrap();

        let product_repo = ProductRepository::new(pool);
        assert!(product_repo.delete(42).await.unwrap());
        assert!(status_repo.find("wc_42").await.unwrap().is_none());
    }
}
