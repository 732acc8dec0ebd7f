//! Schema initialization and idempotent migrations
//!
//! All DDL is `IF NOT EXISTS`; column additions for older cache files run as
//! `ALTER TABLE ... ADD COLUMN` with the duplicate-column error swallowed.
//! Nothing here ever drops data.

use crate::utils::AppError;
use sqlx::SqlitePool;

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        parent_id INTEGER NOT NULL DEFAULT 0,
        kind TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        sku TEXT NOT NULL DEFAULT '',
        permalink TEXT NOT NULL DEFAULT '',
        regular_price TEXT NOT NULL DEFAULT '',
        price TEXT NOT NULL DEFAULT '',
        sale_price TEXT NOT NULL DEFAULT '',
        stock_status TEXT NOT NULL DEFAULT 'outofstock',
        stock_quantity INTEGER,
        description TEXT NOT NULL DEFAULT '',
        retailer_id TEXT NOT NULL UNIQUE,
        images TEXT NOT NULL DEFAULT '[]',
        attributes TEXT NOT NULL DEFAULT '[]',
        categories TEXT NOT NULL DEFAULT '[]',
        variation_ids TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS variations (
        id INTEGER PRIMARY KEY,
        parent_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        kind TEXT NOT NULL DEFAULT 'variation',
        name TEXT NOT NULL DEFAULT '',
        sku TEXT NOT NULL DEFAULT '',
        permalink TEXT NOT NULL DEFAULT '',
        regular_price TEXT NOT NULL DEFAULT '',
        price TEXT NOT NULL DEFAULT '',
        sale_price TEXT NOT NULL DEFAULT '',
        stock_status TEXT NOT NULL DEFAULT 'outofstock',
        stock_quantity INTEGER,
        description TEXT NOT NULL DEFAULT '',
        retailer_id TEXT NOT NULL UNIQUE,
        images TEXT NOT NULL DEFAULT '[]',
        attributes TEXT NOT NULL DEFAULT '[]',
        categories TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sync_status (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        retailer_id TEXT NOT NULL UNIQUE,
        sync_state TEXT NOT NULL DEFAULT 'pending',
        exists_remotely INTEGER NOT NULL DEFAULT 0,
        last_availability TEXT,
        last_inventory INTEGER,
        last_synced_at INTEGER,
        last_error TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS webhook_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic TEXT NOT NULL,
        action TEXT NOT NULL,
        product_id INTEGER NOT NULL,
        name TEXT,
        kind TEXT,
        payload TEXT NOT NULL,
        signature TEXT,
        old_stock_status TEXT,
        new_stock_status TEXT,
        old_stock_quantity INTEGER,
        new_stock_quantity INTEGER,
        stock_delta INTEGER,
        retailer_id TEXT,
        processed INTEGER NOT NULL DEFAULT 0,
        processed_at INTEGER,
        error TEXT,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    )
    "#,
];

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_products_parent ON products(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_products_stock ON products(stock_status)",
    "CREATE INDEX IF NOT EXISTS idx_variations_parent ON variations(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_variations_stock ON variations(stock_status)",
    "CREATE INDEX IF NOT EXISTS idx_sync_status_state ON sync_status(sync_state)",
    "CREATE INDEX IF NOT EXISTS idx_events_processed ON webhook_events(processed)",
    "CREATE INDEX IF NOT EXISTS idx_events_product ON webhook_events(product_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_action ON webhook_events(action)",
    "CREATE INDEX IF NOT EXISTS idx_events_created ON webhook_events(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at)",
];

/// Columns added after the first release; re-applied on every startup for
/// cache files created by older builds
const ADD_COLUMNS: &[&str] = &[
    "ALTER TABLE sync_status ADD COLUMN last_error TEXT",
    "ALTER TABLE webhook_events ADD COLUMN stock_delta INTEGER",
    "ALTER TABLE webhook_events ADD COLUMN retailer_id TEXT",
    "ALTER TABLE products ADD COLUMN categories TEXT NOT NULL DEFAULT '[]'",
    "ALTER TABLE variations ADD COLUMN categories TEXT NOT NULL DEFAULT '[]'",
];

/// Initialize the schema, then apply column migrations
pub async fn init(pool: &SqlitePool) -> Result<(), AppError> {
    for ddl in CREATE_TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create table: {e}")))?;
    }

    for stmt in ADD_COLUMNS {
        if let Err(e) = sqlx::query(stmt).execute(pool).await {
            let message = e.to_string();
            if !message.contains("duplicate column name") {
                return Err(AppError::with_message(
                    shared::ErrorCode::MigrationFailed,
                    format!("Migration failed: {message}"),
                ));
            }
        }
    }

    for ddl in CREATE_INDEXES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create index: {e}")))?;
    }

    Ok(())
}
