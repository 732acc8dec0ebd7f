//! Data models shared between the server, its clients, and tests

pub mod event;
pub mod product;
pub mod session;
pub mod sync_status;

pub use event::{EventAction, WebhookCounters, WebhookEvent, parse_topic};
pub use product::{
    Product, ProductAttribute, ProductCategory, ProductImage, ProductKind, StockStatus,
};
pub use session::Session;
pub use sync_status::{SyncCounters, SyncState, SyncStatus};
