//! Webhook Event Repository
//!
//! Events are inserted on receipt and mutated exactly once to record the
//! processing outcome. The core never deletes them.

use super::RepoResult;
use shared::models::{EventAction, StockStatus, WebhookCounters, WebhookEvent};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Insert payload for a new event row
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub topic: String,
    pub action: EventAction,
    pub product_id: i64,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub payload: serde_json::Value,
    pub signature: Option<String>,
    pub old_stock_status: Option<StockStatus>,
    pub new_stock_status: Option<StockStatus>,
    pub old_stock_quantity: Option<i64>,
    pub new_stock_quantity: Option<i64>,
    pub stock_delta: Option<i64>,
    pub retailer_id: Option<String>,
}

/// SQLite row for webhook_events
#[derive(Debug, Clone, sqlx::FromRow)]
struct EventRow {
    id: i64,
    topic: String,
    action: String,
    product_id: i64,
    name: Option<String>,
    kind: Option<String>,
    payload: String,
    signature: Option<String>,
    old_stock_status: Option<String>,
    new_stock_status: Option<String>,
    old_stock_quantity: Option<i64>,
    new_stock_quantity: Option<i64>,
    stock_delta: Option<i64>,
    retailer_id: Option<String>,
    processed: i64,
    processed_at: Option<i64>,
    error: Option<String>,
    created_at: i64,
}

impl EventRow {
    fn into_event(self) -> WebhookEvent {
        WebhookEvent {
            id: self.id,
            topic: self.topic,
            action: self.action.parse().unwrap_or(EventAction::Updated),
            product_id: self.product_id,
            name: self.name,
            kind: self.kind,
            payload: serde_json::from_str(&self.payload).unwrap_or(serde_json::Value::Null),
            signature: self.signature,
            old_stock_status: self.old_stock_status.and_then(|s| s.parse().ok()),
            new_stock_status: self.new_stock_status.and_then(|s| s.parse().ok()),
            old_stock_quantity: self.old_stock_quantity,
            new_stock_quantity: self.new_stock_quantity,
            stock_delta: self.stock_delta,
            retailer_id: self.retailer_id,
            processed: self.processed != 0,
            processed_at: self.processed_at,
            error: self.error,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new event row, returning its id
    pub async fn insert(&self, event: &NewEvent) -> RepoResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                topic, action, product_id, name, kind, payload, signature,
                old_stock_status, new_stock_status,
                old_stock_quantity, new_stock_quantity, stock_delta,
                retailer_id, processed, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&event.topic)
        .bind(event.action.as_str())
        .bind(event.product_id)
        .bind(&event.name)
        .bind(&event.kind)
        .bind(serde_json::to_string(&event.payload)?)
        .bind(&event.signature)
        .bind(event.old_stock_status.map(|s| s.as_str()))
        .bind(event.new_stock_status.map(|s| s.as_str()))
        .bind(event.old_stock_quantity)
        .bind(event.new_stock_quantity)
        .bind(event.stock_delta)
        .bind(&event.retailer_id)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn mark_processed(&self, id: i64) -> RepoResult<()> {
        sqlx::query("UPDATE webhook_events SET processed = 1, processed_at = ? WHERE id = ?")
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_error(&self, id: i64, error: &str) -> RepoResult<()> {
        sqlx::query(
            "UPDATE webhook_events SET processed = 1, processed_at = ?, error = ? WHERE id = ?",
        )
        .bind(now_millis())
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, id: i64) -> RepoResult<Option<WebhookEvent>> {
        let row: Option<EventRow> = sqlx::query_as("SELECT * FROM webhook_events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EventRow::into_event))
    }

    /// The most recent events, newest first
    pub async fn recent(&self, limit: i64) -> RepoResult<Vec<WebhookEvent>> {
        let rows: Vec<EventRow> =
            sqlx::query_as("SELECT * FROM webhook_events ORDER BY id DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(EventRow::into_event).collect())
    }

    pub async fn counts(&self) -> RepoResult<WebhookCounters> {
        let (received,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM webhook_events")
            .fetch_one(&self.pool)
            .await?;
        let (processed,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM webhook_events WHERE processed = 1 AND error IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        let (errors,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM webhook_events WHERE error IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(WebhookCounters {
            received,
            processed,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn new_event(product_id: i64) -> NewEvent {
        NewEvent {
            topic: "product.updated".into(),
            action: EventAction::Updated,
            product_id,
            name: Some("Shirt".into()),
            kind: Some("simple".into()),
            payload: serde_json::json!({"id": product_id}),
            signature: Some("sig".into()),
            old_stock_status: Some(StockStatus::InStock),
            new_stock_status: Some(StockStatus::OutOfStock),
            old_stock_quantity: Some(7),
            new_stock_quantity: Some(0),
            stock_delta: Some(-7),
            retailer_id: Some(format!("wc_{product_id}")),
        }
    }

    #[tokio::test]
    async fn test_insert_and_mark_processed() {
        let pool = memory_pool().await.unwrap();
        let repo = EventRepository::new(pool);

        let id = repo.insert(&new_event(42)).await.unwrap();
        let event = repo.find(id).await.unwrap().unwrap();
        assert!(!event.processed);
        assert_eq!(event.stock_delta, Some(-7));
        assert_eq!(event.retailer_id.as_deref(), Some("wc_42"));

        repo.mark_processed(id).await.unwrap();
        let event = repo.find(id).await.unwrap().unwrap();
        assert!(event.processed);
        assert!(event.processed_at.is_some());
        assert!(event.error.is_none());

        let counters = repo.counts().await.unwrap();
        assert_eq!(counters.received, 1);
        assert_eq!(counters.processed, 1);
        assert_eq!(counters.errors, 0);
    }

    #[tokio::test]
    async fn test_mark_error_counts() {
        let pool = memory_pool().await.unwrap();
        let repo = EventRepository::new(pool);

        let id = repo.insert(&new_event(42)).await.unwrap();
        repo.mark_error(id, "sync failed").await.unwrap();

        let counters = repo.counts().await.unwrap();
        assert_eq!(counters.received, 1);
        assert_eq!(counters.processed, 0);
        assert_eq!(counters.errors, 1);
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first() {
        let pool = memory_pool().await.unwrap();
        let repo = EventRepository::new(pool);
        for id in 1..=5 {
            repo.insert(&new_event(id)).await.unwrap();
        }
        let recent = repo.recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].product_id, 5);
        assert_eq!(recent[2].product_id, 3);
    }
}
