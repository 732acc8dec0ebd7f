//! Source store client
//!
//! Read-only client for the store-of-record product API. Authentication is
//! the store's legacy key/secret pair passed as query parameters; there is no
//! bearer header. Reads are paginated at 100 rows and terminate on the first
//! short page.

use reqwest::Client;
use serde::de::DeserializeOwned;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Product, ProductKind};

use crate::core::Config;

/// Page size for bulk reads; variation fetches use the same bound and assume
/// parents never exceed it
const PAGE_SIZE: usize = 100;

/// HTTP client for the source store API
pub struct WooClient {
    client: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl WooClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.woo_base_url.trim_end_matches('/').to_string(),
            consumer_key: config.woo_consumer_key.clone(),
            consumer_secret: config.woo_consumer_secret.clone(),
        }
    }

    fn ensure_config(&self) -> AppResult<()> {
        if self.consumer_key.is_empty() || self.consumer_secret.is_empty() {
            return Err(AppError::config_missing("WOO_CONSUMER_KEY/WOO_CONSUMER_SECRET"));
        }
        Ok(())
    }

    /// GET a path under the API base, returning the decoded JSON body
    ///
    /// Any non-success status bubbles up as a fatal read error carrying the
    /// status code and body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.ensure_config()?;

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("consumer_key", self.consumer_key.as_str()),
                ("consumer_secret", self.consumer_secret.as_str()),
            ])
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::source_request(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::source_api(status.as_u16(), body));
        }

        response.json().await.map_err(|e| {
            AppError::with_message(
                ErrorCode::SourceDecodeFailed,
                format!("GET {url} returned undecodable body: {e}"),
            )
        })
    }

    /// Fetch every product matching the filter options, across all pages
    pub async fn fetch_all_products(&self, filters: &[(&str, &str)]) -> AppResult<Vec<Product>> {
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("page", page.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ];
            query.extend(filters.iter().map(|(k, v)| (*k, v.to_string())));

            let mut batch: Vec<Product> = self.get_json("products", &query).await?;
            for product in &mut batch {
                product.normalize_images();
            }

            let fetched = batch.len();
            all.extend(batch);
            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        tracing::debug!(count = all.len(), "Fetched products from source store");
        Ok(all)
    }

    /// Fetch the variations of one variable parent (single page)
    ///
    /// Variation payloads carry neither kind nor parent id; both are stamped
    /// here so every consumer sees fully-formed rows.
    pub async fn fetch_variations(&self, parent_id: i64) -> AppResult<Vec<Product>> {
        let query = [("per_page", PAGE_SIZE.to_string())];
        let mut variations: Vec<Product> = self
            .get_json(&format!("products/{parent_id}/variations"), &query)
            .await?;

        for variation in &mut variations {
            variation.kind = ProductKind::Variation;
            variation.parent_id = parent_id;
            variation.normalize_images();
        }

        Ok(variations)
    }

    /// Fetch a single product by id
    pub async fn fetch_product(&self, id: i64) -> AppResult<Product> {
        let mut product: Product = self.get_json(&format!("products/{id}"), &[]).await?;
        product.normalize_images();
        Ok(product)
    }
}
