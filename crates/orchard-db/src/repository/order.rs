//! # Order Repository (read side)
//!
//! Queries over the order ledger. All writes to orders - creation, status
//! transitions, payment confirmation - go through [`crate::workflow`] so
//! their side effects (stock, coupons, points) stay in one transaction.

use sqlx::SqlitePool;

use crate::error::DbResult;
use orchard_core::{Order, OrderDetail, OrderItem, OrderStatus, StatusEntry};

/// Filters for the admin order listing. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<i64>,
    /// Page size. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
    /// Inclusive lower bound on `created_at` (RFC 3339).
    pub start_date: Option<String>,
    /// Inclusive upper bound on `created_at` (RFC 3339).
    pub end_date: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    /// Upper bound on the page number; keeps `offset()` far from i64
    /// overflow for hostile query strings.
    const MAX_PAGE: i64 = 1_000_000;

    fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, Self::MAX_PAGE)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of the admin order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<OrderDetail>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Repository for order database queries.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its items and status history.
    pub async fn get_detail(&self, order_id: &str) -> DbResult<Option<OrderDetail>> {
        let Some(order) = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_address, payment_method,
                   discount_code, discount_units, points_used, points_earned,
                   subtotal_units, shipping_fee_units, total_units,
                   status, is_paid, paid_at, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = self.items_of(order_id).await?;
        let status_history = self.history_of(order_id).await?;

        Ok(Some(OrderDetail {
            order,
            items,
            status_history,
        }))
    }

    /// Lists a user's orders, newest first, each with items and history.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<OrderDetail>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_address, payment_method,
                   discount_code, discount_units, points_used, points_earned,
                   subtotal_units, shipping_fee_units, total_units,
                   status, is_paid, paid_at, created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(orders).await
    }

    /// Lists all orders with optional status and creation-date filters,
    /// newest first, paginated.
    pub async fn list_all(&self, query: &OrderQuery) -> DbResult<OrderPage> {
        let status = query.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM orders
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            "#,
        )
        .bind(status)
        .bind(&query.start_date)
        .bind(&query.end_date)
        .fetch_one(&self.pool)
        .await?;

        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, shipping_address, payment_method,
                   discount_code, discount_units, points_used, points_earned,
                   subtotal_units, shipping_fee_units, total_units,
                   status, is_paid, paid_at, created_at, updated_at
            FROM orders
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            ORDER BY created_at DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(status)
        .bind(&query.start_date)
        .bind(&query.end_date)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let orders = self.hydrate(orders).await?;

        Ok(OrderPage {
            orders,
            total,
            page: query.page(),
            limit: query.limit(),
        })
    }

    /// Line items of an order, in insertion order.
    pub async fn items_of(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, variant_id,
                   name_snapshot, variant_snapshot, image_snapshot,
                   unit_price_units, quantity, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Status audit trail of an order, in insertion order.
    ///
    /// Ordered by rowid rather than `changed_at`: two entries written in
    /// the same transaction can carry near-identical timestamps, and the
    /// trail must still render in the order the transitions happened.
    pub async fn history_of(&self, order_id: &str) -> DbResult<Vec<StatusEntry>> {
        let history = sqlx::query_as::<_, StatusEntry>(
            r#"
            SELECT id, order_id, status, changed_at
            FROM order_status_history
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    async fn hydrate(&self, orders: Vec<Order>) -> DbResult<Vec<OrderDetail>> {
        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.items_of(&order.id).await?;
            let status_history = self.history_of(&order.id).await?;
            details.push(OrderDetail {
                order,
                items,
                status_history,
            });
        }
        Ok(details)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_bounds_are_clamped() {
        // Hostile page/limit values must not overflow the offset math.
        let q = OrderQuery {
            page: Some(i64::MAX),
            limit: Some(i64::MAX),
            ..Default::default()
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.page(), OrderQuery::MAX_PAGE);
        assert_eq!(q.offset(), (OrderQuery::MAX_PAGE - 1) * 100);

        let q = OrderQuery {
            page: Some(-5),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 1);
        assert_eq!(q.offset(), 0);
    }
}
