//! Replication engine
//!
//! Orchestrates source reads, cache writes, remote reconciliation, and
//! batched catalog mutations. The bulk path replicates the whole in-stock
//! subset; the targeted path refreshes one product and is what the event
//! processor drives.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use shared::catalog::{Availability, BatchItem, BatchMethod, BatchResponse, RemoteItem};
use shared::error::AppResult;
use shared::models::{Product, ProductKind};
use shared::util::now_millis;

use crate::clients::{MetaCatalogClient, WooClient};
use crate::db::repository::{ProductRepository, SyncStatusRepository};
use crate::sync::mapper::{self, FeedStyle, MapperConfig};
use crate::sync::policy;

/// Concurrent variation fetches per fan-out group; each group lands in one
/// cache transaction
const VARIATION_FETCH_GROUP: usize = 10;

/// Report of one bulk replication run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Products returned by the source store
    pub total_products: usize,
    /// Replicable in-stock items emitted to the catalog
    pub in_stock_items: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    /// Out-of-stock rows not emitted
    pub skipped: usize,
    pub started_at: i64,
    pub finished_at: i64,
}

impl SyncReport {
    pub fn duration_ms(&self) -> i64 {
        self.finished_at - self.started_at
    }
}

/// Result of one targeted sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetedOutcome {
    /// Nothing to do (out-of-stock and unknown remotely, or stock unchanged)
    Noop,
    Created,
    Updated,
    /// Submitted but rejected; the rejection is recorded in sync-status
    Failed,
}

/// How a batch response is to be applied to its items
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Top-level error: every item in the batch failed
    Failed(String),
    /// Per-item validation map: retailer id -> first error message, if any
    PerItem(HashMap<String, Option<String>>),
    /// Accepted for async processing (bare handles); trusted to apply
    Accepted,
}

/// Interpret a batch response
///
/// Both the bulk path and the event processor funnel through this function
/// so a bare-handles response means the same thing everywhere.
pub fn interpret_batch_response(response: &BatchResponse) -> BatchOutcome {
    if let Some(error) = &response.error {
        return BatchOutcome::Failed(error.message.clone());
    }
    if let Some(validation) = &response.validation_status {
        let map = validation
            .iter()
            .map(|item| {
                let first_error = item.errors.first().map(|issue| issue.message.clone());
                (item.retailer_id.clone(), first_error)
            })
            .collect();
        return BatchOutcome::PerItem(map);
    }
    BatchOutcome::Accepted
}

/// One emitted batch item plus the bookkeeping needed after the response
struct BatchEntry {
    item: BatchItem,
    availability: Availability,
    inventory: Option<i64>,
}

impl BatchEntry {
    fn new(product: &Product, parent: Option<&Product>, method: BatchMethod, cfg: &MapperConfig) -> Self {
        let retailer_id = policy::retailer_id(product);
        let data = mapper::map_to_item(product, parent, FeedStyle::Standard, cfg);
        Self {
            availability: data.availability,
            inventory: data.inventory,
            item: BatchItem {
                method,
                retailer_id,
                data,
            },
        }
    }
}

/// The replication engine
pub struct SyncEngine {
    pool: SqlitePool,
    woo: Arc<WooClient>,
    meta: Arc<MetaCatalogClient>,
    mapper: MapperConfig,
}

impl SyncEngine {
    pub fn new(
        pool: SqlitePool,
        woo: Arc<WooClient>,
        meta: Arc<MetaCatalogClient>,
        mapper: MapperConfig,
    ) -> Self {
        Self {
            pool,
            woo,
            meta,
            mapper,
        }
    }

    fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    fn statuses(&self) -> SyncStatusRepository {
        SyncStatusRepository::new(self.pool.clone())
    }

    /// Bulk path: replicate the whole in-stock subset of the source store
    pub async fn initial_sync(&self) -> AppResult<SyncReport> {
        let mut report = SyncReport {
            started_at: now_millis(),
            ..Default::default()
        };

        // 1-2. Fetch all in-stock products and cache them in one transaction
        let products = self
            .woo
            .fetch_all_products(&[("stock_status", "instock")])
            .await?;
        report.total_products = products.len();

        let rows: Vec<(Product, String)> = products
            .iter()
            .map(|p| (p.clone(), policy::retailer_id(p)))
            .collect();
        self.products().bulk_upsert(&rows).await?;

        // 3. Materialize the remote existence map
        let remote = self.meta.remote_item_map().await?;

        // 4. Walk the source products and emit batch items
        let mut entries: Vec<BatchEntry> = Vec::new();
        let statuses = self.statuses();

        for product in &products {
            match product.kind {
                ProductKind::Simple => {
                    if product.is_in_stock() {
                        statuses
                            .present(product.id, &policy::retailer_id(product))
                            .await?;
                        entries.push(self.build_entry(product, None, &remote));
                    } else {
                        report.skipped += 1;
                    }
                }
                // Handled below in fan-out groups
                ProductKind::Variable => {}
                // The source never returns bare variations at the top level
                ProductKind::Variation => {}
            }
        }

        let parents: Vec<&Product> = products
            .iter()
            .filter(|p| p.kind == ProductKind::Variable)
            .collect();
        let variation_groups = self.fetch_and_cache_variations(&parents).await?;

        for (parent_id, variations) in &variation_groups {
            let parent = parents
                .iter()
                .find(|p| p.id == *parent_id)
                .copied()
                .expect("group built from this parent list");
            for variation in variations {
                statuses
                    .present(parent.id, &policy::retailer_id(variation))
                    .await?;
                if variation.is_in_stock() {
                    entries.push(self.build_entry(variation, Some(parent), &remote));
                } else {
                    report.skipped += 1;
                }
            }
            // The variable parent itself is deliberately not emitted: the
            // variation rows hold the authoritative price data
        }

        report.in_stock_items = entries.len();

        // 5-6. Submit in chunks and interpret each response
        for chunk in entries.chunks(shared::catalog::MAX_BATCH_REQUESTS) {
            let items: Vec<BatchItem> = chunk.iter().map(|entry| entry.item.clone()).collect();
            let response = self.meta.submit_batch(items).await?;
            let outcome = interpret_batch_response(&response);
            self.apply_outcome(chunk, &outcome, &mut report).await?;
        }

        report.finished_at = now_millis();
        tracing::info!(
            total = report.total_products,
            items = report.in_stock_items,
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            skipped = report.skipped,
            duration_ms = report.duration_ms(),
            "Bulk replication finished"
        );
        Ok(report)
    }

    /// Refresh the cache from the source without touching the ad catalog
    /// (the feed generator's refresh mode)
    pub async fn refresh_cache(&self) -> AppResult<usize> {
        let products = self
            .woo
            .fetch_all_products(&[("stock_status", "instock")])
            .await?;

        let rows: Vec<(Product, String)> = products
            .iter()
            .map(|p| (p.clone(), policy::retailer_id(p)))
            .collect();
        self.products().bulk_upsert(&rows).await?;

        let parents: Vec<&Product> = products
            .iter()
            .filter(|p| p.kind == ProductKind::Variable)
            .collect();
        let groups = self.fetch_and_cache_variations(&parents).await?;
        let variation_count: usize = groups.iter().map(|(_, v)| v.len()).sum();

        Ok(products.len() + variation_count)
    }

    /// Fan variation fetches out in bounded groups; each group's results are
    /// written in a single cache transaction
    async fn fetch_and_cache_variations(
        &self,
        parents: &[&Product],
    ) -> AppResult<Vec<(i64, Vec<Product>)>> {
        let mut all_groups = Vec::with_capacity(parents.len());

        for chunk in parents.chunks(VARIATION_FETCH_GROUP) {
            let fetches = chunk.iter().map(|parent| {
                let parent_id = parent.id;
                async move { (parent_id, self.woo.fetch_variations(parent_id).await) }
            });
            let results = futures::future::join_all(fetches).await;

            let mut groups: Vec<(i64, Vec<(Product, String)>)> = Vec::with_capacity(chunk.len());
            for (parent_id, result) in results {
                let variations = result?;
                let rows = variations
                    .iter()
                    .map(|v| (v.clone(), policy::retailer_id(v)))
                    .collect();
                groups.push((parent_id, rows));
                all_groups.push((parent_id, variations));
            }
            self.products().bulk_upsert_variations(&groups).await?;
        }

        Ok(all_groups)
    }

    fn build_entry(
        &self,
        product: &Product,
        parent: Option<&Product>,
        remote: &HashMap<String, RemoteItem>,
    ) -> BatchEntry {
        let retailer_id = policy::retailer_id(product);
        let method = if remote.contains_key(&retailer_id) {
            BatchMethod::Update
        } else {
            BatchMethod::Create
        };
        BatchEntry::new(product, parent, method, &self.mapper)
    }

    /// Record the outcome of one submitted chunk in sync-status and the
    /// report counters
    async fn apply_outcome(
        &self,
        entries: &[BatchEntry],
        outcome: &BatchOutcome,
        report: &mut SyncReport,
    ) -> AppResult<()> {
        let statuses = self.statuses();

        match outcome {
            BatchOutcome::Failed(message) => {
                for entry in entries {
                    statuses.mark_error(&entry.item.retailer_id, message).await?;
                }
                report.errors += entries.len();
            }
            BatchOutcome::PerItem(map) => {
                for entry in entries {
                    match map.get(&entry.item.retailer_id) {
                        Some(Some(error)) => {
                            statuses.mark_error(&entry.item.retailer_id, error).await?;
                            report.errors += 1;
                        }
                        _ => {
                            self.record_synced(entry, report).await?;
                        }
                    }
                }
            }
            BatchOutcome::Accepted => {
                for entry in entries {
                    self.record_synced(entry, report).await?;
                }
            }
        }

        Ok(())
    }

    async fn record_synced(&self, entry: &BatchEntry, report: &mut SyncReport) -> AppResult<()> {
        self.statuses()
            .mark_synced(
                &entry.item.retailer_id,
                entry.availability.as_str(),
                entry.inventory,
            )
            .await?;
        match entry.item.method {
            BatchMethod::Create => report.created += 1,
            _ => report.updated += 1,
        }
        Ok(())
    }

    /// Targeted path: reconcile one product (with optional parent context)
    pub async fn sync_product(
        &self,
        product: &Product,
        parent: Option<&Product>,
    ) -> AppResult<TargetedOutcome> {
        let retailer_id = policy::retailer_id(product);
        let products = self.products();
        let statuses = self.statuses();

        // Upsert the cache row; a variation needs its parent row in place
        let backing_id = if product.kind == ProductKind::Variation {
            if let Some(parent) = parent {
                products.upsert(parent, &policy::retailer_id(parent)).await?;
            }
            product.parent_id
        } else {
            product.id
        };

        if product.kind == ProductKind::Variation {
            products.upsert_variation(product, &retailer_id).await?;
        } else {
            products.upsert(product, &retailer_id).await?;
        }

        statuses.present(backing_id, &retailer_id).await?;
        let status = statuses.get(&retailer_id).await?;

        let availability = policy::availability(product.stock_status);
        let inventory = policy::inventory(product);

        if !product.is_in_stock() {
            if !status.exists_remotely {
                // Never advertised; nothing to retract
                return Ok(TargetedOutcome::Noop);
            }
            let response = self
                .meta
                .update_stock(&retailer_id, Availability::OutOfStock.as_str(), Some(0))
                .await?;
            return match interpret_batch_response(&response) {
                BatchOutcome::Failed(message) => {
                    statuses.mark_error(&retailer_id, &message).await?;
                    Ok(TargetedOutcome::Failed)
                }
                _ => {
                    statuses
                        .mark_synced(&retailer_id, Availability::OutOfStock.as_str(), Some(0))
                        .await?;
                    Ok(TargetedOutcome::Updated)
                }
            };
        }

        // Unchanged stock: skip the round-trip entirely
        let unchanged = status.last_availability.as_deref() == Some(availability.as_str())
            && status.last_inventory == inventory;
        if unchanged {
            return Ok(TargetedOutcome::Noop);
        }

        // CREATE vs UPDATE is decided by remote existence, not local state
        let remote = self.meta.lookup_by_retailer_id(&retailer_id).await?;
        let method = if remote.is_some() {
            BatchMethod::Update
        } else {
            BatchMethod::Create
        };
        if remote.is_some() && !status.exists_remotely {
            statuses.set_exists_remotely(&retailer_id, true).await?;
        }

        let entry = BatchEntry::new(product, parent, method, &self.mapper);
        let response = self.meta.submit_batch(vec![entry.item.clone()]).await?;

        let mut scratch = SyncReport::default();
        self.apply_outcome(std::slice::from_ref(&entry), &interpret_batch_response(&response), &mut scratch)
            .await?;

        if scratch.errors > 0 {
            Ok(TargetedOutcome::Failed)
        } else if matches!(method, BatchMethod::Create) {
            Ok(TargetedOutcome::Created)
        } else {
            Ok(TargetedOutcome::Updated)
        }
    }

    /// Targeted path for a variable product: refresh every variation, never
    /// the parent itself
    pub async fn sync_variable(&self, parent: &Product) -> AppResult<Vec<TargetedOutcome>> {
        self.products()
            .upsert(parent, &policy::retailer_id(parent))
            .await?;

        let variations = self.woo.fetch_variations(parent.id).await?;
        let mut outcomes = Vec::with_capacity(variations.len());
        for variation in &variations {
            outcomes.push(self.sync_product(variation, Some(parent)).await?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::catalog::{ApiErrorBody, ItemValidation, ValidationIssue};

    #[test]
    fn test_interpret_top_level_error() {
        let response = BatchResponse {
            error: Some(ApiErrorBody {
                message: "token expired".into(),
                error_type: None,
                code: Some(190),
            }),
            ..Default::default()
        };
        assert_eq!(
            interpret_batch_response(&response),
            BatchOutcome::Failed("token expired".into())
        );
    }

    #[test]
    fn test_interpret_per_item_validation() {
        let response = BatchResponse {
            validation_status: Some(vec![
                ItemValidation {
                    retailer_id: "wc_1".into(),
                    errors: vec![ValidationIssue {
                        message: "missing price".into(),
                    }],
                    warnings: vec![],
                },
                ItemValidation {
                    retailer_id: "wc_2".into(),
                    errors: vec![],
                    warnings: vec![ValidationIssue {
                        message: "low resolution image".into(),
                    }],
                },
            ]),
            ..Default::default()
        };

        let BatchOutcome::PerItem(map) = interpret_batch_response(&response) else {
            panic!("expected per-item outcome");
        };
        assert_eq!(map.get("wc_1"), Some(&Some("missing price".into())));
        // Warnings alone do not fail an item
        assert_eq!(map.get("wc_2"), Some(&None));
    }

    #[test]
    fn test_interpret_bare_handles_is_accepted() {
        let response = BatchResponse {
            handles: Some(vec!["AczAbc123".into()]),
            ..Default::default()
        };
        assert_eq!(interpret_batch_response(&response), BatchOutcome::Accepted);
    }
}
