//! Per-replicable-id sync bookkeeping

use serde::{Deserialize, Serialize};

/// Reconciliation state of one ad-catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Pending,
    Synced,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for SyncState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// One row per replicable id (per future ad-catalog entry)
///
/// `product_id` points at the backing `products` row: the parent's id for a
/// variation, the product's own id otherwise. Deleting the product cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub id: i64,
    pub product_id: i64,
    pub retailer_id: String,
    pub sync_state: SyncState,
    /// Latched true once the id has been observed in the remote catalog
    pub exists_remotely: bool,
    pub last_availability: Option<String>,
    pub last_inventory: Option<i64>,
    pub last_synced_at: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Aggregate counters for the status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncCounters {
    pub products_total: i64,
    pub products_in_stock: i64,
    pub variations_total: i64,
    pub variations_in_stock: i64,
    pub synced: i64,
    pub pending: i64,
    pub errors: i64,
}
