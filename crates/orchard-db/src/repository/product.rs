//! # Product Repository
//!
//! Database operations for products and their variants.
//!
//! ## Stock Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Who Writes Stock?                                  │
//! │                                                                         │
//! │  insert()/update() here set the INITIAL stock when the catalog is      │
//! │  created or edited by an admin.                                        │
//! │                                                                         │
//! │  After that, stock is mutated EXCLUSIVELY by the order workflow:       │
//! │    • order creation   → guarded decrement inside the checkout tx       │
//! │    • order cancelled  → restore inside the transition tx               │
//! │                                                                         │
//! │  products.stock mirrors SUM(product_variants.stock) whenever           │
//! │  variants exist; the workflow recomputes it in the same transaction.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use orchard_core::{Product, ProductWithVariants, Variant};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID (without variants).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, category_id,
                price_units, min_price_units, stock, image_url,
                is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product together with its variants.
    pub async fn get_with_variants(&self, id: &str) -> DbResult<Option<ProductWithVariants>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let variants = self.variants_of(id).await?;
        Ok(Some(ProductWithVariants { product, variants }))
    }

    /// Gets all variants of a product.
    pub async fn variants_of(&self, product_id: &str) -> DbResult<Vec<Variant>> {
        let variants = sqlx::query_as::<_, Variant>(
            r#"
            SELECT id, product_id, name, price_units, stock, discount_percentage
            FROM product_variants
            WHERE product_id = ?1
            ORDER BY name
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Lists active products, by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, category_id,
                price_units, min_price_units, stock, image_url,
                is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category_id,
                price_units, min_price_units, stock, image_url,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(product.price_units)
        .bind(product.min_price_units)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a variant and refreshes the product's aggregate stock and
    /// lowest-variant price.
    pub async fn insert_variant(&self, variant: &Variant) -> DbResult<()> {
        debug!(id = %variant.id, product_id = %variant.product_id, "Inserting variant");

        sqlx::query(
            r#"
            INSERT INTO product_variants (
                id, product_id, name, price_units, stock, discount_percentage
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.name)
        .bind(variant.price_units)
        .bind(variant.stock)
        .bind(variant.discount_percentage)
        .execute(&self.pool)
        .await?;

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE products SET
                stock = (SELECT COALESCE(SUM(stock), 0) FROM product_variants WHERE product_id = ?1),
                min_price_units = (SELECT MIN(price_units) FROM product_variants WHERE product_id = ?1),
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(&variant.product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
