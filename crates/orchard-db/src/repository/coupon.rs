//! # Coupon Repository
//!
//! Reads and admin-side inserts for coupons. Redemption (advancing
//! `current_uses` and recording the `coupon_redemptions` row) happens only
//! inside the order-creation transaction in [`crate::workflow`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use orchard_core::Coupon;

/// One finalized redemption of a coupon against an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Redemption {
    pub id: String,
    pub coupon_id: String,
    pub order_id: String,
    pub user_id: String,
    pub used_at: DateTime<Utc>,
}

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Finds a coupon by its code.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, value, kind, max_uses, current_uses,
                   is_active, created_at, updated_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Inserts a new coupon.
    ///
    /// Callers (admin surface, seeder) are expected to have validated the
    /// code format and `max_uses` bounds via `orchard_core::validation`;
    /// the schema CHECK and UNIQUE constraints are the last line.
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(code = %coupon.code, "Inserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, value, kind, max_uses, current_uses,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.value)
        .bind(coupon.kind)
        .bind(coupon.max_uses)
        .bind(coupon.current_uses)
        .bind(coupon.is_active)
        .bind(coupon.created_at)
        .bind(coupon.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the finalized redemptions of a coupon, newest first.
    pub async fn redemptions(&self, coupon_id: &str) -> DbResult<Vec<Redemption>> {
        let rows = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT id, coupon_id, order_id, user_id, used_at
            FROM coupon_redemptions
            WHERE coupon_id = ?1
            ORDER BY used_at DESC
            "#,
        )
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
