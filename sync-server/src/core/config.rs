/// Server configuration — all knobs of the sync service
///
/// # Environment variables
///
/// Every item can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WOO_BASE_URL | http://localhost:8888/wp-json/wc/v3 | Source store API base |
/// | WOO_CONSUMER_KEY | (empty) | Source store key (query parameter) |
/// | WOO_CONSUMER_SECRET | (empty) | Source store secret (query parameter) |
/// | META_API_BASE | https://graph.facebook.com/v18.0 | Ad catalog API base |
/// | META_CATALOG_ID | (empty) | Ad catalog id (path component) |
/// | META_ACCESS_TOKEN | (empty) | Ad catalog bearer token |
/// | WEBHOOK_SECRET | (empty) | Shared HMAC key for push notifications |
/// | BRAND | Generic | Brand constant emitted with every item |
/// | CURRENCY_SUFFIX | BAM | Appended to every price |
/// | IMAGE_RENDER_URL | https://img.ctxdev.xyz/render | Image render service base |
/// | DB_PATH | data/catalog.db | Cache store path |
/// | PUBLIC_DIR | public | CSV feed output directory |
/// | ADMIN_USERNAME | admin | Operator account |
/// | ADMIN_PASSWORD | (empty) | Operator password |
/// | HTTP_PORT | 3000 | HTTP listen port |
///
/// # Example
///
/// ```ignore
/// WOO_BASE_URL=https://store.example.com/wp-json/wc/v3 HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Source store API base (versioned)
    pub woo_base_url: String,
    /// Source store consumer key
    pub woo_consumer_key: String,
    /// Source store consumer secret
    pub woo_consumer_secret: String,
    /// Ad catalog API base (versioned)
    pub meta_api_base: String,
    /// Ad catalog id
    pub meta_catalog_id: String,
    /// Ad catalog bearer token
    pub meta_access_token: String,
    /// Shared HMAC key for webhook signatures
    pub webhook_secret: String,
    /// Brand constant
    pub brand: String,
    /// Currency suffix appended to prices
    pub currency_suffix: String,
    /// Image render service base URL
    pub image_render_url: String,
    /// Cache store path
    pub db_path: String,
    /// CSV feed output directory
    pub public_dir: String,
    /// Operator account name
    pub admin_username: String,
    /// Operator account password
    pub admin_password: String,
    /// HTTP listen port
    pub http_port: u16,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. Credentials default to empty
    /// and fail on first use by the client that needs them.
    pub fn from_env() -> Self {
        Self {
            woo_base_url: std::env::var("WOO_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8888/wp-json/wc/v3".into()),
            woo_consumer_key: std::env::var("WOO_CONSUMER_KEY").unwrap_or_default(),
            woo_consumer_secret: std::env::var("WOO_CONSUMER_SECRET").unwrap_or_default(),
            meta_api_base: std::env::var("META_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com/v18.0".into()),
            meta_catalog_id: std::env::var("META_CATALOG_ID").unwrap_or_default(),
            meta_access_token: std::env::var("META_ACCESS_TOKEN").unwrap_or_default(),
            webhook_secret: std::env::var("WEBHOOK_SECRET").unwrap_or_default(),
            brand: std::env::var("BRAND").unwrap_or_else(|_| "Generic".into()),
            currency_suffix: std::env::var("CURRENCY_SUFFIX").unwrap_or_else(|_| "BAM".into()),
            image_render_url: std::env::var("IMAGE_RENDER_URL")
                .unwrap_or_else(|_| "https://img.ctxdev.xyz/render".into()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "data/catalog.db".into()),
            public_dir: std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".into()),
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_default(),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
        }
    }

    /// Hostname of the source store, used to validate webhook origins
    pub fn source_host(&self) -> Option<String> {
        url::Url::parse(&self.woo_base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
