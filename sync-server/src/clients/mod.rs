//! HTTP clients for the two external stores

pub mod meta;
pub mod woo;

pub use meta::MetaCatalogClient;
pub use woo::WooClient;
