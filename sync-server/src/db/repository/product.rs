//! Product & Variation Repository
//!
//! Products and variations live in separate tables so the feed fast path can
//! enumerate variations without touching the product table. Variations carry
//! a cascade foreign key to their parent product row.

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductKind, StockStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

const UPSERT_PRODUCT: &str = r#"
    INSERT INTO products (
        id, parent_id, kind, name, sku, permalink,
        regular_price, price, sale_price, stock_status, stock_quantity,
        description, retailer_id, images, attributes, categories,
        variation_ids, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        parent_id = excluded.parent_id,
        kind = excluded.kind,
        name = excluded.name,
        sku = excluded.sku,
        permalink = excluded.permalink,
        regular_price = excluded.regular_price,
        price = excluded.price,
        sale_price = excluded.sale_price,
        stock_status = excluded.stock_status,
        stock_quantity = excluded.stock_quantity,
        description = excluded.description,
        retailer_id = excluded.retailer_id,
        images = excluded.images,
        attributes = excluded.attributes,
        categories = excluded.categories,
        variation_ids = excluded.variation_ids,
        updated_at = excluded.updated_at
"#;

const UPSERT_VARIATION: &str = r#"
    INSERT INTO variations (
        id, parent_id, kind, name, sku, permalink,
        regular_price, price, sale_price, stock_status, stock_quantity,
        description, retailer_id, images, attributes, categories,
        created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        parent_id = excluded.parent_id,
        kind = excluded.kind,
        name = excluded.name,
        sku = excluded.sku,
        permalink = excluded.permalink,
        regular_price = excluded.regular_price,
        price = excluded.price,
        sale_price = excluded.sale_price,
        stock_status = excluded.stock_status,
        stock_quantity = excluded.stock_quantity,
        description = excluded.description,
        retailer_id = excluded.retailer_id,
        images = excluded.images,
        attributes = excluded.attributes,
        categories = excluded.categories,
        updated_at = excluded.updated_at
"#;

/// SQLite row for the products table
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    parent_id: i64,
    kind: String,
    name: String,
    sku: String,
    permalink: String,
    regular_price: String,
    price: String,
    sale_price: String,
    stock_status: String,
    stock_quantity: Option<i64>,
    description: String,
    images: String,
    attributes: String,
    categories: String,
    variation_ids: String,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            parent_id: self.parent_id,
            kind: self.kind.parse().unwrap_or(ProductKind::Simple),
            name: self.name,
            sku: self.sku,
            permalink: self.permalink,
            regular_price: self.regular_price,
            price: self.price,
            sale_price: self.sale_price,
            stock_status: self
                .stock_status
                .parse()
                .unwrap_or(StockStatus::OutOfStock),
            stock_quantity: self.stock_quantity,
            description: self.description,
            images: serde_json::from_str(&self.images).unwrap_or_default(),
            image: None,
            attributes: serde_json::from_str(&self.attributes).unwrap_or_default(),
            categories: serde_json::from_str(&self.categories).unwrap_or_default(),
            variations: serde_json::from_str(&self.variation_ids).unwrap_or_default(),
        }
    }
}

/// SQLite row for the variations table (no nested variation list)
#[derive(Debug, Clone, sqlx::FromRow)]
struct VariationRow {
    id: i64,
    parent_id: i64,
    sku: String,
    name: String,
    permalink: String,
    regular_price: String,
    price: String,
    sale_price: String,
    stock_status: String,
    stock_quantity: Option<i64>,
    description: String,
    images: String,
    attributes: String,
    categories: String,
}

impl VariationRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            parent_id: self.parent_id,
            kind: ProductKind::Variation,
            name: self.name,
            sku: self.sku,
            permalink: self.permalink,
            regular_price: self.regular_price,
            price: self.price,
            sale_price: self.sale_price,
            stock_status: self
                .stock_status
                .parse()
                .unwrap_or(StockStatus::OutOfStock),
            stock_quantity: self.stock_quantity,
            description: self.description,
            images: serde_json::from_str(&self.images).unwrap_or_default(),
            image: None,
            attributes: serde_json::from_str(&self.attributes).unwrap_or_default(),
            categories: serde_json::from_str(&self.categories).unwrap_or_default(),
            variations: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn bind_product<'q>(
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        product: &'q Product,
        retailer_id: &'q str,
    ) -> RepoResult<sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>> {
        Ok(query
            .bind(product.id)
            .bind(product.parent_id)
            .bind(product.kind.as_str())
            .bind(&product.name)
            .bind(&product.sku)
            .bind(&product.permalink)
            .bind(&product.regular_price)
            .bind(&product.price)
            .bind(&product.sale_price)
            .bind(product.stock_status.as_str())
            .bind(product.stock_quantity)
            .bind(&product.description)
            .bind(retailer_id)
            .bind(serde_json::to_string(&product.images)?)
            .bind(serde_json::to_string(&product.attributes)?)
            .bind(serde_json::to_string(&product.categories)?))
    }

    /// Upsert a single top-level product row
    pub async fn upsert(&self, product: &Product, retailer_id: &str) -> RepoResult<()> {
        let now = now_millis();
        let query = Self::bind_product(sqlx::query(UPSERT_PRODUCT), product, retailer_id)?
            .bind(serde_json::to_string(&product.variations)?)
            .bind(now)
            .bind(now);
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// Upsert many product rows in one transaction
    pub async fn bulk_upsert(&self, products: &[(Product, String)]) -> RepoResult<()> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        for (product, retailer_id) in products {
            let query = Self::bind_product(sqlx::query(UPSERT_PRODUCT), product, retailer_id)?
                .bind(serde_json::to_string(&product.variations)?)
                .bind(now)
                .bind(now);
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Upsert one variation row; the parent product row must already exist
    pub async fn upsert_variation(&self, variation: &Product, retailer_id: &str) -> RepoResult<()> {
        let now = now_millis();
        let query =
            Self::bind_product(sqlx::query(UPSERT_VARIATION), variation, retailer_id)?
                .bind(now)
                .bind(now);
        query.execute(&self.pool).await?;
        Ok(())
    }

    /// Write the variations of several parents in a single transaction, so
    /// one fan-out group becomes one consistent cache write
    pub async fn bulk_upsert_variations(
        &self,
        groups: &[(i64, Vec<(Product, String)>)],
    ) -> RepoResult<()> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        for (_, variations) in groups {
            for (variation, retailer_id) in variations {
                let query =
                    Self::bind_product(sqlx::query(UPSERT_VARIATION), variation, retailer_id)?
                .bind(now)
                .bind(now);
                query.execute(&mut *tx).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Find a top-level product by id
    pub async fn find(&self, id: i64) -> RepoResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ProductRow::into_product))
    }

    /// Find a variation by id
    pub async fn find_variation(&self, id: i64) -> RepoResult<Option<Product>> {
        let row: Option<VariationRow> = sqlx::query_as("SELECT * FROM variations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(VariationRow::into_product))
    }

    /// Find a cached row in either table
    pub async fn find_any(&self, id: i64) -> RepoResult<Option<Product>> {
        if let Some(product) = self.find(id).await? {
            return Ok(Some(product));
        }
        self.find_variation(id).await
    }

    /// All in-stock top-level products of one kind
    pub async fn list_in_stock(&self, kind: ProductKind) -> RepoResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT * FROM products WHERE kind = ? AND stock_status = 'instock' ORDER BY id",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    /// All cached variations of one parent
    pub async fn list_variations(&self, parent_id: i64) -> RepoResult<Vec<Product>> {
        let rows: Vec<VariationRow> =
            sqlx::query_as("SELECT * FROM variations WHERE parent_id = ? ORDER BY id")
                .bind(parent_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(VariationRow::into_product).collect())
    }

    /// Delete a top-level product; variations and sync-status rows cascade
    pub async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete one variation row
    pub async fn delete_variation(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM variations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// (total, in-stock) counts for one table
    pub async fn counts(&self) -> RepoResult<(i64, i64, i64, i64)> {
        let (products_total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        let (products_in_stock,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM products WHERE stock_status = 'instock'")
                .fetch_one(&self.pool)
                .await?;
        let (variations_total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM variations")
            .fetch_one(&self.pool)
            .await?;
        let (variations_in_stock,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM variations WHERE stock_status = 'instock'")
                .fetch_one(&self.pool)
                .await?;
        Ok((
            products_total,
            products_in_stock,
            variations_total,
            variations_in_stock,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::sync::policy;

    fn simple(id: i64, stock: StockStatus) -> Product {
        Product {
            id,
            kind: ProductKind::Simple,
            name: format!("Product {id}"),
            regular_price: "10.00".into(),
            stock_status: stock,
            stock_quantity: Some(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let pool = memory_pool().await.unwrap();
        let repo = ProductRepository::new(pool);
        let product = simple(42, StockStatus::InStock);
        let rid = policy::retailer_id(&product);

        repo.upsert(&product, &rid).await.unwrap();
        repo.upsert(&product, &rid).await.unwrap();

        let cached = repo.find(42).await.unwrap().unwrap();
        assert_eq!(cached.name, "Product 42");
        assert_eq!(cached.stock_quantity, Some(5));

        let (total, in_stock, _, _) = repo.counts().await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(in_stock, 1);
    }

    #[tokio::test]
    async fn test_variation_requires_parent_and_cascades() {
        let pool = memory_pool().await.unwrap();
        let repo = ProductRepository::new(pool);

        let variation = Product {
            id: 201,
            parent_id: 100,
            kind: ProductKind::Variation,
            stock_status: StockStatus::InStock,
            ..Default::default()
        };

        // No parent row yet: the foreign key must reject the write
        assert!(repo.upsert_variation(&variation, "wc_201").await.is_err());

        let mut parent = simple(100, StockStatus::InStock);
        parent.kind = ProductKind::Variable;
        repo.upsert(&parent, &policy::retailer_id(&parent))
            .await
            .unwrap();
        repo.upsert_variation(&variation, "wc_201").await.unwrap();

        assert!(repo.find_variation(201).await.unwrap().is_some());

        // Deleting the parent cascades to the variation
        assert!(repo.delete(100).await.unwrap());
        assert!(repo.find_variation(201).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_lists() {
        let pool = memory_pool().await.unwrap();
        let repo = ProductRepository::new(pool);

        let mut product = simple(7, StockStatus::InStock);
        product.kind = ProductKind::Variable;
        product.images = vec![shared::models::ProductImage {
            src: "https://x/a.jpg".into(),
        }];
        product.attributes = vec![shared::models::ProductAttribute {
            name: "Color".into(),
            option: None,
            options: vec!["Red".into(), "Blue".into()],
        }];
        product.variations = vec![8, 9];

        repo.upsert(&product, &policy::retailer_id(&product))
            .await
            .unwrap();
        let cached = repo.find(7).await.unwrap().unwrap();
        assert_eq!(cached.images, product.images);
        assert_eq!(cached.attributes, product.attributes);
        assert_eq!(cached.variations, vec![8, 9]);
    }
}
