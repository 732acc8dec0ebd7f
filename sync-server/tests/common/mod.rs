//! Shared fixtures: in-process stand-ins for the source store and the ad
//! catalog, plus config/database helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde_json::{Value, json};

use sync_server::Config;

pub const CATALOG_ID: &str = "cat123";

/// Captured state of the fake source store
#[derive(Default)]
pub struct WooData {
    /// Top-level products returned by /products
    pub products: Vec<Value>,
    /// Variations per parent id
    pub variations: HashMap<i64, Vec<Value>>,
}

async fn woo_products(
    State(data): State<Arc<WooData>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    // A single short page; page 2 and beyond are empty
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);
    if page > 1 {
        return Json(json!([]));
    }
    Json(Value::Array(data.products.clone()))
}

async fn woo_product(State(data): State<Arc<WooData>>, Path(id): Path<i64>) -> Json<Value> {
    let found = data
        .products
        .iter()
        .find(|p| p.get("id").and_then(Value::as_i64) == Some(id))
        .cloned()
        .unwrap_or(Value::Null);
    Json(found)
}

async fn woo_variations(State(data): State<Arc<WooData>>, Path(id): Path<i64>) -> Json<Value> {
    Json(Value::Array(
        data.variations.get(&id).cloned().unwrap_or_default(),
    ))
}

/// Spawn the fake source store; returns its base URL
pub async fn spawn_fake_woo(data: WooData) -> String {
    let router = Router::new()
        .route("/wp-json/wc/v3/products", get(woo_products))
        .route("/wp-json/wc/v3/products/{id}", get(woo_product))
        .route("/wp-json/wc/v3/products/{id}/variations", get(woo_variations))
        .with_state(Arc::new(data));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/wp-json/wc/v3")
}

/// Captured state of the fake ad catalog
#[derive(Default)]
pub struct MetaData {
    /// Remote rows returned by enumeration and lookup
    pub remote: Vec<Value>,
    /// Bodies received on the batch endpoint
    pub batches: Mutex<Vec<Value>>,
}

async fn meta_products(
    State(data): State<Arc<MetaData>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let rows = match params.get("filter") {
        Some(filter) => {
            let wanted = serde_json::from_str::<Value>(filter)
                .ok()
                .and_then(|f| {
                    f.pointer("/retailer_id/eq")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_default();
            data.remote
                .iter()
                .filter(|row| {
                    row.get("retailer_id").and_then(Value::as_str) == Some(wanted.as_str())
                })
                .cloned()
                .collect()
        }
        None => data.remote.clone(),
    };
    Json(json!({ "data": rows }))
}

async fn meta_batch(State(data): State<Arc<MetaData>>, Json(body): Json<Value>) -> Json<Value> {
    data.batches.lock().unwrap().push(body);
    Json(json!({ "handles": ["fake-handle"] }))
}

/// Spawn the fake ad catalog; returns (api base, captured state)
pub async fn spawn_fake_meta(remote: Vec<Value>) -> (String, Arc<MetaData>) {
    let data = Arc::new(MetaData {
        remote,
        batches: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .route(&format!("/v18.0/{CATALOG_ID}/products"), get(meta_products))
        .route(&format!("/v18.0/{CATALOG_ID}/items_batch"), post(meta_batch))
        .with_state(data.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}/v18.0"), data)
}

/// A config pointing at the fakes and a temp cache file
pub fn test_config(woo_base: &str, meta_base: &str, db_path: &str) -> Config {
    Config {
        woo_base_url: woo_base.to_string(),
        woo_consumer_key: "ck_test".into(),
        woo_consumer_secret: "cs_test".into(),
        meta_api_base: meta_base.to_string(),
        meta_catalog_id: CATALOG_ID.into(),
        meta_access_token: "token".into(),
        webhook_secret: "wh_secret".into(),
        brand: "CTX".into(),
        currency_suffix: "BAM".into(),
        image_render_url: "https://img.ctxdev.xyz/render".into(),
        db_path: db_path.to_string(),
        public_dir: "public".into(),
        admin_username: "admin".into(),
        admin_password: "pw".into(),
        http_port: 0,
    }
}

/// The simple product of scenario S1
pub fn product_42() -> Value {
    json!({
        "id": 42,
        "type": "simple",
        "name": "Shirt",
        "permalink": "https://x/shirt",
        "regular_price": "10.00",
        "price": "10.00",
        "stock_status": "instock",
        "stock_quantity": 7,
        "images": [{"src": "https://x/s.jpg"}]
    })
}
