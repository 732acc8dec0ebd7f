//! Push-notification processor
//!
//! Validates incoming webhooks (topic, source host, HMAC signature, JSON
//! body), records an event row with the stock delta pre-computed, responds
//! immediately, and performs the replication work on a background task so
//! the source store never times out and re-delivers.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use ring::hmac;
use sqlx::SqlitePool;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{EventAction, Product, ProductKind, parse_topic};

use crate::clients::{MetaCatalogClient, WooClient};
use crate::db::repository::{EventRepository, NewEvent, ProductRepository, SyncStatusRepository};
use crate::sync::engine::{BatchOutcome, interpret_batch_response};
use crate::sync::{SyncEngine, policy};

use super::locks::{ProductLocks, lock_key};

/// The webhook headers the processor consumes
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub topic: Option<String>,
    pub signature: Option<String>,
    pub source: Option<String>,
    pub delivery_id: Option<String>,
}

impl WebhookHeaders {
    pub fn from_header_map(headers: &http::HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            topic: get("x-wc-webhook-topic"),
            signature: get("x-wc-webhook-signature"),
            source: get("x-wc-webhook-source"),
            delivery_id: get("x-wc-webhook-delivery-id"),
        }
    }
}

/// Verify a base64 HMAC-SHA-256 signature over the raw body
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, body);
    let expected = BASE64_STANDARD.encode(tag.as_ref());
    ring::constant_time::verify_slices_are_equal(expected.as_bytes(), signature.as_bytes()).is_ok()
}

/// The event processor
#[derive(Clone)]
pub struct EventProcessor {
    pool: SqlitePool,
    engine: Arc<SyncEngine>,
    woo: Arc<WooClient>,
    meta: Arc<MetaCatalogClient>,
    locks: Arc<ProductLocks>,
    webhook_secret: String,
    source_host: Option<String>,
}

impl EventProcessor {
    pub fn new(
        pool: SqlitePool,
        engine: Arc<SyncEngine>,
        woo: Arc<WooClient>,
        meta: Arc<MetaCatalogClient>,
        locks: Arc<ProductLocks>,
        webhook_secret: String,
        source_host: Option<String>,
    ) -> Self {
        Self {
            pool,
            engine,
            woo,
            meta,
            locks,
            webhook_secret,
            source_host,
        }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    fn events(&self) -> EventRepository {
        EventRepository::new(self.pool.clone())
    }

    fn statuses(&self) -> SyncStatusRepository {
        SyncStatusRepository::new(self.pool.clone())
    }

    /// Validate a push, persist the event row, and schedule the work
    ///
    /// Returns the event id. Validation short-circuits in the documented
    /// order: missing topic (400), foreign source host (403), bad signature
    /// (401), undecodable body (400).
    pub async fn accept(&self, headers: WebhookHeaders, body: &[u8]) -> AppResult<i64> {
        let topic = headers
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::new(ErrorCode::WebhookTopicMissing))?;
        let action = parse_topic(topic).ok_or_else(|| {
            AppError::invalid_request(format!("Unsupported webhook topic: {topic}"))
        })?;

        if let Some(expected) = &self.source_host {
            let source_host = headers
                .source
                .as_deref()
                .and_then(|s| url::Url::parse(s).ok())
                .and_then(|u| u.host_str().map(str::to_string));
            if source_host.as_deref() != Some(expected.as_str()) {
                return Err(AppError::new(ErrorCode::WebhookSourceMismatch));
            }
        }

        let signature = headers.signature.as_deref().unwrap_or_default();
        if !verify_signature(&self.webhook_secret, body, signature) {
            return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
        }

        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| AppError::new(ErrorCode::WebhookPayloadInvalid))?;
        let mut product: Product = serde_json::from_value(payload.clone())
            .map_err(|_| AppError::new(ErrorCode::WebhookPayloadInvalid))?;
        product.normalize_images();

        // Pre-compute the stock delta against the cache
        let cached = self.products().find_any(product.id).await?;
        let old_stock_status = cached.as_ref().map(|c| c.stock_status);
        let old_stock_quantity = cached.as_ref().and_then(|c| c.stock_quantity);
        let stock_delta = match (product.stock_quantity, old_stock_quantity) {
            (Some(new), Some(old)) => Some(new - old),
            _ => None,
        };

        let event = NewEvent {
            topic: topic.to_string(),
            action,
            product_id: product.id,
            name: (!product.name.is_empty()).then(|| product.name.clone()),
            kind: Some(product.kind.as_str().to_string()),
            payload,
            signature: headers.signature.clone(),
            old_stock_status,
            new_stock_status: Some(product.stock_status),
            old_stock_quantity,
            new_stock_quantity: product.stock_quantity,
            stock_delta,
            retailer_id: Some(policy::retailer_id(&product)),
        };
        let event_id = self.events().insert(&event).await?;

        tracing::info!(
            event_id,
            product_id = product.id,
            action = action.as_str(),
            delivery_id = headers.delivery_id.as_deref().unwrap_or(""),
            "Webhook accepted"
        );

        // Respond now; do the replication work on a background task
        let processor = self.clone();
        tokio::spawn(async move {
            processor.process(event_id, action, product).await;
        });

        Ok(event_id)
    }

    /// Run one event to completion and record the outcome on its row
    async fn process(&self, event_id: i64, action: EventAction, product: Product) {
        let key = lock_key(&product);
        let _guard = self.locks.acquire(key).await;

        match self.dispatch(action, &product).await {
            Ok(()) => {
                if let Err(e) = self.events().mark_processed(event_id).await {
                    tracing::error!(event_id, "Failed to mark event processed: {e}");
                }
            }
            Err(e) => {
                tracing::error!(
                    event_id,
                    product_id = product.id,
                    "Event processing failed: {e}"
                );
                if let Err(mark_err) = self.events().mark_error(event_id, &e.to_string()).await {
                    tracing::error!(event_id, "Failed to mark event errored: {mark_err}");
                }
            }
        }
    }

    async fn dispatch(&self, action: EventAction, product: &Product) -> AppResult<()> {
        match action {
            EventAction::Created | EventAction::Restored => {
                // Upsert always; targeted-sync (recursive for variable) only
                // when in stock. An out-of-stock creation can never advertise
                // a remotely-unknown row, so no upstream fetches either.
                if !product.is_in_stock() {
                    self.cache_only(product).await?;
                    return Ok(());
                }
                match product.kind {
                    ProductKind::Variable => {
                        self.engine.sync_variable(product).await?;
                    }
                    ProductKind::Variation => {
                        self.sync_variation(product).await?;
                    }
                    ProductKind::Simple => {
                        self.engine.sync_product(product, None).await?;
                    }
                }
            }
            EventAction::Updated => match product.kind {
                ProductKind::Variable => {
                    self.engine.sync_variable(product).await?;
                }
                ProductKind::Variation => {
                    self.sync_variation(product).await?;
                }
                ProductKind::Simple => {
                    self.engine.sync_product(product, None).await?;
                }
            },
            EventAction::Deleted => {
                self.handle_deleted(product).await?;
            }
        }
        Ok(())
    }

    /// Cache a row without touching either store
    ///
    /// A variation row needs its parent in place for the foreign key; with
    /// no cached parent there is nothing to anchor it to yet, so the write
    /// is skipped until a later event (or run) brings the parent in.
    async fn cache_only(&self, product: &Product) -> AppResult<()> {
        let retailer_id = policy::retailer_id(product);
        if product.kind == ProductKind::Variation {
            if self.products().find(product.parent_id).await?.is_some() {
                self.products()
                    .upsert_variation(product, &retailer_id)
                    .await?;
            }
        } else {
            self.products().upsert(product, &retailer_id).await?;
        }
        Ok(())
    }

    /// Targeted sync of one variation, rehydrating the parent when the cache
    /// has never seen it
    async fn sync_variation(&self, variation: &Product) -> AppResult<()> {
        let parent = match self.products().find(variation.parent_id).await? {
            Some(parent) => parent,
            None => {
                let parent = self.woo.fetch_product(variation.parent_id).await?;
                self.products()
                    .upsert(&parent, &policy::retailer_id(&parent))
                    .await?;
                parent
            }
        };
        self.engine.sync_product(variation, Some(&parent)).await?;
        Ok(())
    }

    /// Deletion: retract from the catalog as out-of-stock, then drop the
    /// cache rows (sync-status follows by cascade)
    async fn handle_deleted(&self, product: &Product) -> AppResult<()> {
        // Deletion payloads can be sparse; prefer the cached row for an
        // accurate kind and parent id
        let subject = self
            .products()
            .find_any(product.id)
            .await?
            .unwrap_or_else(|| product.clone());
        let retailer_id = policy::retailer_id(&subject);

        if let Some(status) = self.statuses().find(&retailer_id).await?
            && status.exists_remotely
        {
            let response = self
                .meta
                .update_stock(
                    &retailer_id,
                    shared::catalog::Availability::OutOfStock.as_str(),
                    Some(0),
                )
                .await?;
            if let BatchOutcome::Failed(message) = interpret_batch_response(&response) {
                return Err(AppError::catalog_api(message));
            }
        }

        match subject.kind {
            ProductKind::Variation => {
                self.products().delete_variation(subject.id).await?;
                // Variation sync rows hang off the parent product and do not
                // cascade from the variations table
                self.statuses().delete(&retailer_id).await?;
            }
            _ => {
                self.products().delete(subject.id).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_signature_round_trip() {
        let secret = "shhh";
        let body = br#"{"id": 42}"#;
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = BASE64_STANDARD.encode(hmac::sign(&key, body).as_ref());

        assert!(verify_signature(secret, body, &signature));
        assert!(!verify_signature(secret, body, "bogus"));
        assert!(!verify_signature("other", body, &signature));
        assert!(!verify_signature(secret, b"tampered", &signature));
    }
}
