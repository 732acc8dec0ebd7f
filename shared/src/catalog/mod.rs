//! Ad-catalog wire types
//!
//! Shapes exchanged with the downstream catalog API and reused by the CSV
//! feed generator.

pub mod batch;
pub mod item;

pub use batch::{
    ApiErrorBody, BatchItem, BatchMethod, BatchRequest, BatchResponse, CatalogPage,
    DEFAULT_ENUMERATION_FIELDS, ITEM_TYPE, ItemValidation, MAX_BATCH_REQUESTS, Paging, RemoteItem,
    ValidationIssue,
};
pub use item::{Availability, CatalogImage, CatalogItem};
