//! End-to-end replication scenarios against in-process store fakes

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use shared::models::{SyncState, parse_topic};
use sync_server::clients::{MetaCatalogClient, WooClient};
use sync_server::db::DbService;
use sync_server::db::repository::{EventRepository, ProductRepository, SyncStatusRepository};
use sync_server::events::{EventProcessor, ProductLocks, WebhookHeaders};
use sync_server::sync::{MapperConfig, SyncEngine};

use common::{MetaData, WooData, product_42, spawn_fake_meta, spawn_fake_woo, test_config};

struct Harness {
    pool: sqlx::SqlitePool,
    engine: Arc<SyncEngine>,
    processor: EventProcessor,
    meta_data: Arc<MetaData>,
    _tmp: tempfile::TempDir,
}

async fn harness(woo: WooData, remote: Vec<Value>) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("cache.db");

    let woo_base = spawn_fake_woo(woo).await;
    let (meta_base, meta_data) = spawn_fake_meta(remote).await;
    let config = test_config(&woo_base, &meta_base, db_path.to_str().unwrap());

    let db = DbService::new(&config.db_path).await.unwrap();
    let woo_client = Arc::new(WooClient::new(&config));
    let meta_client = Arc::new(MetaCatalogClient::new(&config));
    let mapper = MapperConfig::from(&config);
    let engine = Arc::new(SyncEngine::new(
        db.pool.clone(),
        woo_client.clone(),
        meta_client.clone(),
        mapper,
    ));
    let processor = EventProcessor::new(
        db.pool.clone(),
        engine.clone(),
        woo_client,
        meta_client,
        Arc::new(ProductLocks::new()),
        config.webhook_secret.clone(),
        config.source_host(),
    );

    Harness {
        pool: db.pool,
        engine,
        processor,
        meta_data,
        _tmp: tmp,
    }
}

fn batch_requests(meta_data: &MetaData) -> Vec<Value> {
    meta_data
        .batches
        .lock()
        .unwrap()
        .iter()
        .flat_map(|body| {
            body.get("requests")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

async fn wait_for_event_processed(pool: &sqlx::SqlitePool, event_id: i64) {
    let events = EventRepository::new(pool.clone());
    for _ in 0..100 {
        if let Some(event) = events.find(event_id).await.unwrap()
            && event.processed
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("event {event_id} never finished processing");
}

fn sign(secret: &str, body: &[u8]) -> String {
    use base64::Engine;
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(ring::hmac::sign(&key, body).as_ref())
}

fn webhook_headers(topic: &str, signature: String) -> WebhookHeaders {
    WebhookHeaders {
        topic: Some(topic.to_string()),
        signature: Some(signature),
        source: Some("http://127.0.0.1/".to_string()),
        delivery_id: Some("d-1".to_string()),
    }
}

// S1 - single simple product, first sync
#[tokio::test]
async fn test_initial_sync_single_simple_product() {
    let harness = harness(
        WooData {
            products: vec![product_42()],
            ..Default::default()
        },
        Vec::new(),
    )
    .await;

    let report = harness.engine.initial_sync().await.unwrap();
    assert_eq!(report.total_products, 1);
    assert_eq!(report.in_stock_items, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.errors, 0);

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["method"], "CREATE");
    assert_eq!(request["retailer_id"], "wc_42");
    assert_eq!(request["data"]["id"], "wc_42");
    assert_eq!(request["data"]["price"], "10.00 BAM");
    assert_eq!(request["data"]["image"].as_array().unwrap().len(), 3);
    assert_eq!(
        request["data"]["image"][1]["tag"],
        json!(["ASPECT_RATIO_4_5_PREFERRED"])
    );

    let status = SyncStatusRepository::new(harness.pool.clone())
        .get("wc_42")
        .await
        .unwrap();
    assert_eq!(status.sync_state, SyncState::Synced);
    assert_eq!(status.last_availability.as_deref(), Some("in stock"));
    assert_eq!(status.last_inventory, Some(7));
    assert!(status.exists_remotely);
}

// S2 - variable product with two variations; only the in-stock variation is
// emitted and the parent is not
#[tokio::test]
async fn test_initial_sync_variable_product() {
    let parent = json!({
        "id": 100,
        "type": "variable",
        "name": "Hoodie",
        "permalink": "https://x/hoodie",
        "regular_price": "30.00",
        "stock_status": "instock",
        "variations": [201, 202],
        "images": [{"src": "https://x/h.jpg"}]
    });
    let variations = vec![
        json!({
            "id": 201,
            "regular_price": "12.00",
            "sale_price": "8.00",
            "stock_status": "instock",
            "stock_quantity": 3,
            "image": {"src": "https://x/v1.jpg"}
        }),
        json!({
            "id": 202,
            "regular_price": "12.00",
            "stock_status": "outofstock",
            "stock_quantity": 0
        }),
    ];

    let harness = harness(
        WooData {
            products: vec![parent],
            variations: [(100i64, variations)].into_iter().collect(),
        },
        Vec::new(),
    )
    .await;

    let report = harness.engine.initial_sync().await.unwrap();
    assert_eq!(report.in_stock_items, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.skipped, 1);

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["retailer_id"], "wc_201");
    assert_eq!(requests[0]["data"]["item_group_id"], "wc_100");
    assert_eq!(requests[0]["data"]["sale_price"], "8.00 BAM");

    // wc_100_main is nowhere in the batch
    assert!(
        requests
            .iter()
            .all(|r| r["retailer_id"] != "wc_100_main")
    );

    // Both variations are cached and registered in sync-status
    let products = ProductRepository::new(harness.pool.clone());
    assert!(products.find_variation(201).await.unwrap().is_some());
    assert!(products.find_variation(202).await.unwrap().is_some());
    let statuses = SyncStatusRepository::new(harness.pool.clone());
    assert!(statuses.find("wc_201").await.unwrap().is_some());
    assert!(statuses.find("wc_202").await.unwrap().is_some());
}

// Invariant: a second run over an unchanged source creates nothing and
// updates every in-stock replicable row
#[tokio::test]
async fn test_second_sync_is_all_updates() {
    let harness = harness(
        WooData {
            products: vec![product_42()],
            ..Default::default()
        },
        vec![json!({"retailer_id": "wc_42", "availability": "in stock", "inventory": 7})],
    )
    .await;

    let report = harness.engine.initial_sync().await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(report.updated, report.in_stock_items);

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests[0]["method"], "UPDATE");
}

// S3 - update event with unchanged stock issues no batch requests
#[tokio::test]
async fn test_update_event_unchanged_stock_is_noop() {
    let harness = harness(WooData::default(), Vec::new()).await;

    // Seed the cache as a previous sync would have left it
    let products = ProductRepository::new(harness.pool.clone());
    let cached: shared::models::Product = serde_json::from_value(product_42()).unwrap();
    products.upsert(&cached, "wc_42").await.unwrap();
    let statuses = SyncStatusRepository::new(harness.pool.clone());
    statuses.present(42, "wc_42").await.unwrap();
    statuses.mark_synced("wc_42", "in stock", Some(7)).await.unwrap();

    let body = serde_json::to_vec(&product_42()).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.updated", signature), &body)
        .await
        .unwrap();

    wait_for_event_processed(&harness.pool, event_id).await;

    let events = EventRepository::new(harness.pool.clone());
    let event = events.find(event_id).await.unwrap().unwrap();
    assert!(event.processed);
    assert!(event.error.is_none());
    assert_eq!(event.stock_delta, Some(0));

    // Zero batch requests issued
    assert!(batch_requests(&harness.meta_data).is_empty());
}

// S4 - deletion of a remotely-known product retracts it and drops the rows
#[tokio::test]
async fn test_delete_event_retracts_and_cascades() {
    let harness = harness(WooData::default(), Vec::new()).await;

    let products = ProductRepository::new(harness.pool.clone());
    let cached: shared::models::Product = serde_json::from_value(product_42()).unwrap();
    products.upsert(&cached, "wc_42").await.unwrap();
    let statuses = SyncStatusRepository::new(harness.pool.clone());
    statuses.present(42, "wc_42").await.unwrap();
    statuses.mark_synced("wc_42", "in stock", Some(7)).await.unwrap();

    let body = serde_json::to_vec(&json!({"id": 42})).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.deleted", signature), &body)
        .await
        .unwrap();

    wait_for_event_processed(&harness.pool, event_id).await;

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["method"], "UPDATE");
    assert_eq!(requests[0]["retailer_id"], "wc_42");
    assert_eq!(requests[0]["data"]["availability"], "out of stock");
    assert_eq!(requests[0]["data"]["inventory"], 0);

    // Cache row gone, sync-status cascaded
    assert!(products.find(42).await.unwrap().is_none());
    assert!(statuses.find("wc_42").await.unwrap().is_none());
}

// An out-of-stock creation is cached but triggers no targeted sync and no
// upstream fetches, whatever the product kind
#[tokio::test]
async fn test_out_of_stock_creation_caches_without_traffic() {
    let harness = harness(WooData::default(), Vec::new()).await;
    let products = ProductRepository::new(harness.pool.clone());

    // Variable parent: cached, variations never fetched
    let parent = json!({
        "id": 100,
        "type": "variable",
        "name": "Hoodie",
        "stock_status": "outofstock",
        "variations": [201]
    });
    let body = serde_json::to_vec(&parent).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.created", signature), &body)
        .await
        .unwrap();
    wait_for_event_processed(&harness.pool, event_id).await;

    assert!(products.find(100).await.unwrap().is_some());
    assert!(products.list_variations(100).await.unwrap().is_empty());

    // Orphan variation: no parent rehydration, nothing to anchor the row to
    let variation = json!({
        "id": 301,
        "type": "variation",
        "parent_id": 300,
        "stock_status": "outofstock"
    });
    let body = serde_json::to_vec(&variation).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.created", signature), &body)
        .await
        .unwrap();
    wait_for_event_processed(&harness.pool, event_id).await;

    let events = EventRepository::new(harness.pool.clone());
    let event = events.find(event_id).await.unwrap().unwrap();
    assert!(event.error.is_none());
    assert!(products.find(300).await.unwrap().is_none());
    assert!(products.find_variation(301).await.unwrap().is_none());

    assert!(batch_requests(&harness.meta_data).is_empty());
}

// A remotely-known product going out of stock issues exactly one UPDATE
// with availability "out of stock" and inventory 0
#[tokio::test]
async fn test_stock_out_transition_issues_single_update() {
    let harness = harness(WooData::default(), Vec::new()).await;

    let products = ProductRepository::new(harness.pool.clone());
    let cached: shared::models::Product = serde_json::from_value(product_42()).unwrap();
    products.upsert(&cached, "wc_42").await.unwrap();
    let statuses = SyncStatusRepository::new(harness.pool.clone());
    statuses.present(42, "wc_42").await.unwrap();
    statuses.mark_synced("wc_42", "in stock", Some(7)).await.unwrap();

    let mut payload = product_42();
    payload["stock_status"] = json!("outofstock");
    payload["stock_quantity"] = json!(0);
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.updated", signature), &body)
        .await
        .unwrap();

    wait_for_event_processed(&harness.pool, event_id).await;

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["method"], "UPDATE");
    assert_eq!(requests[0]["retailer_id"], "wc_42");
    assert_eq!(requests[0]["data"]["availability"], "out of stock");
    assert_eq!(requests[0]["data"]["inventory"], 0);

    let status = statuses.get("wc_42").await.unwrap();
    assert_eq!(status.last_availability.as_deref(), Some("out of stock"));
    assert_eq!(status.last_inventory, Some(0));
}

// A variation event whose parent was never cached triggers a parent fetch
#[tokio::test]
async fn test_variation_event_rehydrates_parent() {
    let parent = json!({
        "id": 100,
        "type": "variable",
        "name": "Hoodie",
        "permalink": "https://x/hoodie",
        "regular_price": "30.00",
        "stock_status": "instock",
        "variations": [201]
    });
    let harness = harness(
        WooData {
            products: vec![parent],
            ..Default::default()
        },
        Vec::new(),
    )
    .await;

    let payload = json!({
        "id": 201,
        "type": "variation",
        "parent_id": 100,
        "regular_price": "12.00",
        "stock_status": "instock",
        "stock_quantity": 2
    });
    let body = serde_json::to_vec(&payload).unwrap();
    let signature = sign("wh_secret", &body);
    let event_id = harness
        .processor
        .accept(webhook_headers("product.updated", signature), &body)
        .await
        .unwrap();

    wait_for_event_processed(&harness.pool, event_id).await;

    // Parent was fetched from the source and cached; the variation synced
    let products = ProductRepository::new(harness.pool.clone());
    let parent = products.find(100).await.unwrap().unwrap();
    assert_eq!(parent.name, "Hoodie");
    assert!(products.find_variation(201).await.unwrap().is_some());

    let requests = batch_requests(&harness.meta_data);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["retailer_id"], "wc_201");
    assert_eq!(requests[0]["data"]["item_group_id"], "wc_100");
    // Title comes from the rehydrated parent
    assert_eq!(requests[0]["data"]["title"], "Hoodie");
}

#[test]
fn test_topic_parser_accepts_product_topics_only() {
    assert!(parse_topic("product.created").is_some());
    assert!(parse_topic("order.updated").is_none());
}
