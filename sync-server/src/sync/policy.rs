//! Retailer-id policy
//!
//! The single place external ids, group ids, and availability are computed.
//! The replication engine, the event processor, the mapper, and the feed
//! generator all call these functions, so a variation reached through any
//! path resolves to the same ad-catalog row.

use shared::catalog::Availability;
use shared::models::{Product, ProductKind, StockStatus};

/// Prefix shared by every external id
pub const RETAILER_PREFIX: &str = "wc_";

/// Stable external id of a replicable row
///
/// - simple product  -> `wc_<id>`
/// - variable parent -> `wc_<id>_main`
/// - variation       -> `wc_<id>`
///
/// The `_main` suffix keeps a variable parent's own id from colliding with
/// the group id of its variations.
pub fn retailer_id(product: &Product) -> String {
    match product.kind {
        ProductKind::Variable => format!("{RETAILER_PREFIX}{}_main", product.id),
        ProductKind::Simple | ProductKind::Variation => {
            format!("{RETAILER_PREFIX}{}", product.id)
        }
    }
}

/// Group id tying sibling variations together; simple products have none
pub fn group_id(product: &Product) -> Option<String> {
    match product.kind {
        ProductKind::Variation => Some(format!("{RETAILER_PREFIX}{}", product.parent_id)),
        ProductKind::Variable => Some(format!("{RETAILER_PREFIX}{}", product.id)),
        ProductKind::Simple => None,
    }
}

/// Map source stock status onto ad-catalog availability
pub fn availability(status: StockStatus) -> Availability {
    match status {
        StockStatus::InStock => Availability::InStock,
        StockStatus::OnBackorder => Availability::Preorder,
        StockStatus::OutOfStock => Availability::OutOfStock,
    }
}

/// Inventory to advertise: out-of-stock always reports 0, in-stock reports
/// the quantity when the source tracks one
pub fn inventory(product: &Product) -> Option<i64> {
    match product.stock_status {
        StockStatus::OutOfStock => Some(0),
        _ => product.stock_quantity,
    }
}
