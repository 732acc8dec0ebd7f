//! Push-notification ingestion

pub mod locks;
pub mod processor;

pub use locks::{ProductLocks, lock_key};
pub use processor::{EventProcessor, WebhookHeaders, verify_signature};
