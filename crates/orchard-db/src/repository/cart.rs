//! # Cart Repository
//!
//! A user's saved cart lines. The checkout transaction removes the exact
//! (product, variant) pairs that were ordered; lines the user left out of
//! the order survive.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::generate_id;
use orchard_core::CartItem;

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Lists a user's cart lines, oldest first.
    pub async fn items_for_user(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, user_id, product_id, variant_id, quantity, created_at
            FROM cart_items
            WHERE user_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adds a line to the cart, or bumps the quantity when the same
    /// (product, variant) pair is already there.
    pub async fn upsert_item(
        &self,
        user_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, variant_id, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, product_id, variant_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            "#,
        )
        .bind(generate_id())
        .bind(user_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes one (product, variant) line from a user's cart.
    ///
    /// `variant_id IS ?3` so a NULL variant matches the no-variant line.
    pub async fn remove_item(
        &self,
        user_id: &str,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE user_id = ?1 AND product_id = ?2 AND variant_id IS ?3
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(variant_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
