//! Per-product-id serialization
//!
//! The targeted path reads a cache row before writing it, so two concurrent
//! events for the same product would race. Work is serialized through a lock
//! table keyed by source product id, with variation events normalized onto
//! their parent so parent and variation events cannot interleave either.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use shared::models::{Product, ProductKind};

/// Lock key for one event: the parent id for variations, the product's own
/// id otherwise
pub fn lock_key(product: &Product) -> i64 {
    if product.kind == ProductKind::Variation && product.parent_id > 0 {
        product.parent_id
    } else {
        product.id
    }
}

/// Keyed lock table; different product ids progress in parallel
#[derive(Default)]
pub struct ProductLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one key, waiting if an earlier event holds it
    pub async fn acquire(&self, key: i64) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
