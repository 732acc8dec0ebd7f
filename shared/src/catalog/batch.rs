//! Batch endpoint envelopes and catalog read shapes

use serde::{Deserialize, Serialize};

use super::item::CatalogItem;

/// Fixed item type for every batch envelope
pub const ITEM_TYPE: &str = "PRODUCT_ITEM";

/// Maximum requests accepted per batch call
pub const MAX_BATCH_REQUESTS: usize = 1000;

/// Mutation method for one batch entry
///
/// `Delete` exists in the wire protocol but the service never emits it;
/// removals are advertised as out-of-stock updates instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BatchMethod {
    Create,
    Update,
    Delete,
}

/// One entry in a batch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub method: BatchMethod,
    pub retailer_id: String,
    pub data: CatalogItem,
}

/// Batch request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub item_type: String,
    pub requests: Vec<BatchItem>,
}

impl BatchRequest {
    pub fn new(requests: Vec<BatchItem>) -> Self {
        Self {
            item_type: ITEM_TYPE.to_string(),
            requests,
        }
    }
}

/// Error object embedded in API response bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Per-item validation issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub message: String,
}

/// Per-item validation result keyed by retailer id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemValidation {
    pub retailer_id: String,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationIssue>,
}

impl ItemValidation {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Batch endpoint response
///
/// The remote side returns either async handles (no per-item status), a
/// per-item validation array, or a top-level error. Interpretation is the
/// engine's responsibility; the client hands this back raw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<Vec<ItemValidation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

/// Minimal remote row the reconciler needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteItem {
    #[serde(default)]
    pub retailer_id: String,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub inventory: Option<i64>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Default field list for catalog enumeration
pub const DEFAULT_ENUMERATION_FIELDS: &str = "retailer_id,availability,inventory";

/// Cursor paging block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of catalog enumeration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub data: Vec<RemoteItem>,
    #[serde(default)]
    pub paging: Option<Paging>,
}
