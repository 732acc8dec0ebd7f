//! Ad-catalog client
//!
//! Batch-oriented catalog API client. Bearer-token authenticated; catalog id
//! and token are validated on every call. Transport failures surface as
//! errors, API errors come back inside the response body's error object and
//! are left for the engine to interpret.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use shared::catalog::{
    ApiErrorBody, BatchItem, BatchRequest, BatchResponse, CatalogPage,
    DEFAULT_ENUMERATION_FIELDS, ITEM_TYPE, MAX_BATCH_REQUESTS, RemoteItem,
};
use shared::error::{AppError, AppResult, ErrorCode};

use crate::core::Config;

/// Page size for catalog enumeration
const ENUMERATION_LIMIT: usize = 500;

/// HTTP client for the ad-catalog batch API
pub struct MetaCatalogClient {
    client: Client,
    api_base: String,
    catalog_id: String,
    access_token: String,
}

impl MetaCatalogClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base: config.meta_api_base.trim_end_matches('/').to_string(),
            catalog_id: config.meta_catalog_id.clone(),
            access_token: config.meta_access_token.clone(),
        }
    }

    fn ensure_config(&self) -> AppResult<()> {
        if self.catalog_id.is_empty() || self.access_token.is_empty() {
            return Err(AppError::new(ErrorCode::CatalogConfigMissing));
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::catalog_request(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::catalog_request(format!("GET {url} body read failed: {e}")))?;

        if !status.is_success() {
            return Err(AppError::catalog_api(format!(
                "GET {url} returned status {status}: {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::with_message(
                ErrorCode::CatalogDecodeFailed,
                format!("GET {url} returned undecodable body: {e}"),
            )
        })
    }

    /// Enumerate the full catalog state, following the cursor chain until
    /// exhausted
    pub async fn enumerate(&self, fields: &str, limit: usize) -> AppResult<Vec<RemoteItem>> {
        self.ensure_config()?;

        let mut url = format!(
            "{}/{}/products?fields={}&limit={}",
            self.api_base, self.catalog_id, fields, limit
        );
        let mut all = Vec::new();

        loop {
            let page: CatalogPage = self.get_json(&url).await?;
            all.extend(page.data);
            match page.paging.and_then(|p| p.next) {
                Some(next) => url = next,
                None => break,
            }
        }

        tracing::debug!(count = all.len(), "Enumerated remote catalog");
        Ok(all)
    }

    /// The remote existence map the reconciler consumes
    pub async fn remote_item_map(&self) -> AppResult<HashMap<String, RemoteItem>> {
        let items = self
            .enumerate(DEFAULT_ENUMERATION_FIELDS, ENUMERATION_LIMIT)
            .await?;
        Ok(items
            .into_iter()
            .map(|item| (item.retailer_id.clone(), item))
            .collect())
    }

    /// Look up the one remote row with the given retailer id
    pub async fn lookup_by_retailer_id(&self, retailer_id: &str) -> AppResult<Option<RemoteItem>> {
        self.ensure_config()?;

        let filter = serde_json::json!({"retailer_id": {"eq": retailer_id}}).to_string();
        let mut url = url::Url::parse(&format!("{}/{}/products", self.api_base, self.catalog_id))
            .map_err(|e| AppError::catalog_request(format!("Invalid catalog URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("filter", &filter)
            .append_pair("fields", DEFAULT_ENUMERATION_FIELDS);

        let page: CatalogPage = self.get_json(url.as_str()).await?;
        Ok(page.data.into_iter().next())
    }

    /// Submit up to 1000 tagged mutations in one batch call
    ///
    /// Every data block gets its own `id` forced to the entry's retailer id;
    /// the remote API requires the duplication. The raw response is returned
    /// for the caller to interpret.
    pub async fn submit_batch(&self, requests: Vec<BatchItem>) -> AppResult<BatchResponse> {
        self.ensure_config()?;

        if requests.len() > MAX_BATCH_REQUESTS {
            return Err(AppError::with_message(
                ErrorCode::BatchTooLarge,
                format!(
                    "Batch of {} exceeds the {MAX_BATCH_REQUESTS}-item limit",
                    requests.len()
                ),
            ));
        }

        let requests: Vec<BatchItem> = requests
            .into_iter()
            .map(|mut entry| {
                entry.data.id = entry.retailer_id.clone();
                entry
            })
            .collect();
        let body = serde_json::to_value(BatchRequest::new(requests))
            .map_err(|e| AppError::internal(format!("Batch serialization failed: {e}")))?;

        self.post_items_batch(body).await
    }

    /// Convenience wrapper: a single-item UPDATE adjusting stock only
    pub async fn update_stock(
        &self,
        retailer_id: &str,
        availability: &str,
        inventory: Option<i64>,
    ) -> AppResult<BatchResponse> {
        self.ensure_config()?;

        let mut data = serde_json::json!({
            "id": retailer_id,
            "availability": availability,
        });
        if let Some(inventory) = inventory {
            data["inventory"] = inventory.into();
        }
        let body = serde_json::json!({
            "item_type": ITEM_TYPE,
            "requests": [{
                "method": "UPDATE",
                "retailer_id": retailer_id,
                "data": data,
            }],
        });

        self.post_items_batch(body).await
    }

    async fn post_items_batch(&self, body: serde_json::Value) -> AppResult<BatchResponse> {
        let url = format!("{}/{}/items_batch", self.api_base, self.catalog_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::catalog_request(format!("POST {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::catalog_request(format!("POST {url} body read failed: {e}")))?;

        match serde_json::from_str::<BatchResponse>(&text) {
            Ok(parsed) if status.is_success() || parsed.error.is_some() => Ok(parsed),
            // Failure bodies without a usable error object still become
            // in-band errors for the engine
            _ => Ok(BatchResponse {
                error: Some(ApiErrorBody {
                    message: format!("status {status}: {text}"),
                    error_type: None,
                    code: None,
                }),
                ..Default::default()
            }),
        }
    }

    /// Poll one async batch handle
    pub async fn poll_handle(&self, handle: &str) -> AppResult<serde_json::Value> {
        self.ensure_config()?;
        let url = format!("{}/{}", self.api_base, handle);
        self.get_json(&url).await
    }

    /// Catalog metadata (name and business)
    pub async fn catalog_info(&self) -> AppResult<serde_json::Value> {
        self.ensure_config()?;
        let url = format!(
            "{}/{}?fields=name,business",
            self.api_base, self.catalog_id
        );
        self.get_json(&url).await
    }
}
