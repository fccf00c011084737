//! # Order Workflow Engine
//!
//! Every order mutation runs here, inside a single transaction.
//!
//! ## One Transaction Per Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_order                                           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    load catalog slice + coupon + point balance                          │
//! │    checkout::plan()            ← pure, no storage access                │
//! │    INSERT order / items / history(PENDING)                              │
//! │    guarded stock decrements    ← stock >= qty or the tx fails           │
//! │    recompute aggregate stock for varianted products                     │
//! │    guarded coupon redemption   ← current_uses < max_uses or fail        │
//! │    guarded point debit         ← points >= spent or fail                │
//! │    COD? append PROCESSING                                               │
//! │    delete ordered cart lines                                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT rolls back every write. There is no partial   │
//! │  order: no orphaned stock decrement, no half-redeemed coupon.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarded Updates
//! Planning validates against a read snapshot; a concurrent checkout may
//! consume the same stock before this transaction commits. The guards in
//! the UPDATE's WHERE clause (`stock >= ?`, `current_uses < max_uses`,
//! `points >= ?`) make the stale writer fail cleanly with zero rows
//! affected instead of driving a balance negative.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::repository::generate_id;
use crate::repository::order::OrderRepository;
use orchard_core::checkout::{self, CheckoutRequest, RequestedItem};
use orchard_core::{
    validation, CheckoutPlan, CoreError, Coupon, Money, Order, OrderDetail, OrderStatus,
    PaymentMethod, ProductWithVariants, Variant,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors from the order workflow: either a domain rule was violated or
/// the database failed.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Db(DbError::from(err))
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

// =============================================================================
// Requests
// =============================================================================

/// Everything needed to create an order for an authenticated user.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<RequestedItem>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    /// Coupon code to redeem, if any.
    pub discount_code: Option<String>,
    /// Loyalty points to spend, if any.
    pub points_used: i64,
    pub shipping_fee: Money,
}

// =============================================================================
// Workflow
// =============================================================================

/// The transactional write side of the order ledger.
#[derive(Debug, Clone)]
pub struct OrderWorkflow {
    pool: SqlitePool,
}

impl OrderWorkflow {
    /// Creates a new OrderWorkflow.
    pub fn new(pool: SqlitePool) -> Self {
        OrderWorkflow { pool }
    }

    // -------------------------------------------------------------------------
    // Order creation
    // -------------------------------------------------------------------------

    /// Creates an order: plans the checkout against the current catalog,
    /// then executes every write in one transaction.
    pub async fn create_order(&self, new_order: NewOrder) -> WorkflowResult<OrderDetail> {
        validation::validate_order_request(
            &new_order.items,
            &new_order.shipping_address,
            new_order.points_used,
            new_order.shipping_fee.units(),
        )
        .map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let catalog = self.load_catalog(&mut tx, &new_order.items).await?;
        let coupon = match &new_order.discount_code {
            Some(code) => Some(self.load_coupon(&mut tx, code).await?),
            None => None,
        };
        let points_balance = if new_order.points_used > 0 {
            self.load_points(&mut tx, &new_order.user_id).await?
        } else {
            0
        };

        let plan = checkout::plan(&CheckoutRequest {
            items: &new_order.items,
            catalog: &catalog,
            coupon: coupon.as_ref(),
            points_requested: new_order.points_used,
            points_balance,
            shipping_fee: new_order.shipping_fee,
        })?;

        let order_id = generate_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, shipping_address, payment_method,
                discount_code, discount_units, points_used, points_earned,
                subtotal_units, shipping_fee_units, total_units,
                status, is_paid, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, NULL, ?13, ?13)
            "#,
        )
        .bind(&order_id)
        .bind(&new_order.user_id)
        .bind(&new_order.shipping_address)
        .bind(new_order.payment_method)
        .bind(coupon.as_ref().map(|c| c.code.as_str()))
        .bind(plan.discount_total)
        .bind(plan.points.points_used)
        .bind(plan.points_earned)
        .bind(plan.subtotal)
        .bind(plan.shipping_fee)
        .bind(plan.total)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &plan.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, variant_id,
                    name_snapshot, variant_snapshot, image_snapshot,
                    unit_price_units, quantity, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(generate_id())
            .bind(&order_id)
            .bind(&line.product_id)
            .bind(&line.variant_id)
            .bind(&line.name)
            .bind(&line.variant_name)
            .bind(&line.image)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        self.append_history(&mut tx, &order_id, OrderStatus::Pending)
            .await?;

        self.execute_stock_changes(&mut tx, &plan).await?;

        if let Some(coupon) = &coupon {
            self.redeem_coupon(&mut tx, coupon, &order_id, &new_order.user_id)
                .await?;
        }

        if plan.points.points_used > 0 {
            self.debit_points(&mut tx, &new_order.user_id, plan.points.points_used)
                .await?;
        }

        // Cash on delivery needs no payment step; move straight to fulfilment.
        if new_order.payment_method == PaymentMethod::Cod {
            self.append_history(&mut tx, &order_id, OrderStatus::Processing)
                .await?;
            self.set_status(&mut tx, &order_id, OrderStatus::Processing)
                .await?;
        }

        for item in &new_order.items {
            sqlx::query(
                r#"
                DELETE FROM cart_items
                WHERE user_id = ?1 AND product_id = ?2 AND variant_id IS ?3
                "#,
            )
            .bind(&new_order.user_id)
            .bind(&item.product_id)
            .bind(&item.variant_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order_id,
            user_id = %new_order.user_id,
            total = %plan.total,
            "Order created"
        );

        self.detail(&order_id).await
    }

    // -------------------------------------------------------------------------
    // Status transitions
    // -------------------------------------------------------------------------

    /// Moves an order to `target` status, applying the transition's side
    /// effects (stock restoration, point refunds, COD payment settlement)
    /// in the same transaction.
    pub async fn update_status(
        &self,
        order_id: &str,
        target: OrderStatus,
    ) -> WorkflowResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let order = self.load_order(&mut tx, order_id).await?;
        order.status.check_transition(target)?;

        match target {
            OrderStatus::Cancelled => {
                self.restore_stock(&mut tx, &order).await?;
                // Monetary refunds run through the payment provider, outside
                // this system. Spent points come back immediately.
                if order.is_paid && order.points_used > 0 {
                    sqlx::query("UPDATE users SET points = points + ?2 WHERE id = ?1")
                        .bind(&order.user_id)
                        .bind(order.points_used)
                        .execute(&mut *tx)
                        .await?;
                    info!(
                        order_id = %order.id,
                        points = order.points_used,
                        "Refunded spent points on cancellation"
                    );
                }
            }
            OrderStatus::Delivered => {
                // Delivery settles a COD order: the courier collected cash.
                if order.payment_method == PaymentMethod::Cod && !order.is_paid {
                    self.mark_paid(&mut tx, &order).await?;
                }
            }
            _ => {}
        }

        self.append_history(&mut tx, order_id, target).await?;
        self.set_status(&mut tx, order_id, target).await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            from = %order.status,
            to = %target,
            "Order status updated"
        );

        self.detail(order_id).await
    }

    // -------------------------------------------------------------------------
    // Payment confirmation
    // -------------------------------------------------------------------------

    /// Applies a payment gateway callback. A failed payment changes
    /// nothing; a successful one marks the order paid, advances PENDING
    /// orders to PROCESSING, and credits earned points. Idempotent: a
    /// second success callback for an already-paid order is a no-op, and
    /// a late callback for a cancelled order is ignored - the stock went
    /// back already and the buyer earns nothing from a dead order.
    pub async fn confirm_payment(
        &self,
        order_id: &str,
        success: bool,
    ) -> WorkflowResult<OrderDetail> {
        let mut tx = self.pool.begin().await?;

        let order = self.load_order(&mut tx, order_id).await?;

        if !success {
            warn!(order_id = %order_id, "Payment callback reported failure");
            tx.rollback().await?;
            return self.detail(order_id).await;
        }

        if order.is_paid {
            debug!(order_id = %order_id, "Payment already confirmed, ignoring");
            tx.rollback().await?;
            return self.detail(order_id).await;
        }

        if order.status == OrderStatus::Cancelled {
            warn!(order_id = %order_id, "Payment callback for a cancelled order, ignoring");
            tx.rollback().await?;
            return self.detail(order_id).await;
        }

        self.mark_paid(&mut tx, &order).await?;

        if order.status == OrderStatus::Pending {
            self.append_history(&mut tx, order_id, OrderStatus::Processing)
                .await?;
            self.set_status(&mut tx, order_id, OrderStatus::Processing)
                .await?;
        }

        tx.commit().await?;

        info!(order_id = %order_id, "Payment confirmed");

        self.detail(order_id).await
    }

    // -------------------------------------------------------------------------
    // Transaction helpers
    // -------------------------------------------------------------------------

    async fn load_order(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
    ) -> WorkflowResult<Order> {
        sqlx::query_as::<_, Order>(
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
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Loads the distinct products referenced by the request, with their
    /// variants, in first-reference order.
    async fn load_catalog(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        items: &[RequestedItem],
    ) -> WorkflowResult<Vec<ProductWithVariants>> {
        let mut seen: Vec<&str> = Vec::new();
        for item in items {
            if !seen.contains(&item.product_id.as_str()) {
                seen.push(item.product_id.as_str());
            }
        }

        let mut catalog = Vec::with_capacity(seen.len());
        for product_id in seen {
            let product = sqlx::query_as::<_, orchard_core::Product>(
                r#"
                SELECT id, name, description, category_id,
                       price_units, min_price_units, stock, image_url,
                       is_active, created_at, updated_at
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

            let variants = sqlx::query_as::<_, Variant>(
                r#"
                SELECT id, product_id, name, price_units, stock, discount_percentage
                FROM product_variants
                WHERE product_id = ?1
                ORDER BY name
                "#,
            )
            .bind(product_id)
            .fetch_all(&mut **tx)
            .await?;

            catalog.push(ProductWithVariants { product, variants });
        }

        Ok(catalog)
    }

    async fn load_coupon(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        code: &str,
    ) -> WorkflowResult<Coupon> {
        sqlx::query_as::<_, Coupon>(
            r#"
            SELECT id, code, value, kind, max_uses, current_uses,
                   is_active, created_at, updated_at
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::CouponNotFound(code.to_string()).into())
    }

    async fn load_points(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
    ) -> WorkflowResult<i64> {
        let points: Option<i64> = sqlx::query_scalar("SELECT points FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

        points.ok_or_else(|| DbError::not_found("User", user_id).into())
    }

    /// Executes the plan's stock decrements with a `stock >= ?` guard, then
    /// recomputes the aggregate stock of every varianted product touched.
    async fn execute_stock_changes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan: &CheckoutPlan,
    ) -> WorkflowResult<()> {
        for (change, line) in plan.stock_changes.iter().zip(&plan.lines) {
            let result = match &change.variant_id {
                Some(variant_id) => {
                    sqlx::query(
                        r#"
                        UPDATE product_variants
                        SET stock = stock - ?2
                        WHERE id = ?1 AND stock >= ?2
                        "#,
                    )
                    .bind(variant_id)
                    .bind(change.quantity)
                    .execute(&mut **tx)
                    .await?
                }
                None => {
                    sqlx::query(
                        r#"
                        UPDATE products
                        SET stock = stock - ?2, updated_at = ?3
                        WHERE id = ?1 AND stock >= ?2
                        "#,
                    )
                    .bind(&change.product_id)
                    .bind(change.quantity)
                    .bind(Utc::now())
                    .execute(&mut **tx)
                    .await?
                }
            };

            // Zero rows means a concurrent checkout drained the stock after
            // we planned. Re-read the truth and fail the whole transaction.
            if result.rows_affected() == 0 {
                let available = self.current_stock(tx, change).await?;
                let item = match &line.variant_name {
                    Some(variant) => format!("{} of {}", variant, line.name),
                    None => line.name.clone(),
                };
                return Err(CoreError::InsufficientStock {
                    item,
                    available,
                    requested: change.quantity,
                }
                .into());
            }
        }

        for product_id in &plan.aggregate_products {
            self.recompute_aggregate_stock(tx, product_id).await?;
        }

        Ok(())
    }

    async fn current_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        change: &checkout::StockChange,
    ) -> WorkflowResult<i64> {
        let stock: Option<i64> = match &change.variant_id {
            Some(variant_id) => {
                sqlx::query_scalar("SELECT stock FROM product_variants WHERE id = ?1")
                    .bind(variant_id)
                    .fetch_optional(&mut **tx)
                    .await?
            }
            None => sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(&change.product_id)
                .fetch_optional(&mut **tx)
                .await?,
        };

        Ok(stock.unwrap_or(0))
    }

    /// `products.stock` mirrors the variant sum for varianted products.
    async fn recompute_aggregate_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        product_id: &str,
    ) -> WorkflowResult<()> {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = (
                    SELECT COALESCE(SUM(stock), 0)
                    FROM product_variants
                    WHERE product_id = ?1
                ),
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Redeems a coupon: bumps `current_uses` behind a validity guard and
    /// records the redemption against the real order id. Single step, so a
    /// rolled-back order never leaves a phantom use behind.
    async fn redeem_coupon(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        coupon: &Coupon,
        order_id: &str,
        user_id: &str,
    ) -> WorkflowResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE coupons
            SET current_uses = current_uses + 1, updated_at = ?2
            WHERE id = ?1 AND is_active = 1 AND current_uses < max_uses
            "#,
        )
        .bind(&coupon.id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            // Raced past the cap between planning and here.
            return Err(CoreError::CouponNotApplicable {
                code: coupon.code.clone(),
                reason: "coupon has reached its maximum uses".to_string(),
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO coupon_redemptions (id, coupon_id, order_id, user_id, used_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(generate_id())
        .bind(&coupon.id)
        .bind(order_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        debug!(code = %coupon.code, order_id = %order_id, "Coupon redeemed");
        Ok(())
    }

    async fn debit_points(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        points: i64,
    ) -> WorkflowResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET points = points - ?2, updated_at = ?3
            WHERE id = ?1 AND points >= ?2
            "#,
        )
        .bind(user_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            let available: i64 = sqlx::query_scalar("SELECT points FROM users WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?
                .unwrap_or(0);
            return Err(CoreError::InsufficientPoints {
                available,
                requested: points,
            }
            .into());
        }

        Ok(())
    }

    /// Returns every reserved unit of a cancelled order to its stock row,
    /// then refreshes the aggregate stock of varianted products.
    async fn restore_stock(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order: &Order,
    ) -> WorkflowResult<()> {
        let items = sqlx::query_as::<_, orchard_core::OrderItem>(
            r#"
            SELECT id, order_id, product_id, variant_id,
                   name_snapshot, variant_snapshot, image_snapshot,
                   unit_price_units, quantity, created_at
            FROM order_items
            WHERE order_id = ?1
            "#,
        )
        .bind(&order.id)
        .fetch_all(&mut **tx)
        .await?;

        let mut aggregate: Vec<String> = Vec::new();
        for item in &items {
            match &item.variant_id {
                Some(variant_id) => {
                    sqlx::query("UPDATE product_variants SET stock = stock + ?2 WHERE id = ?1")
                        .bind(variant_id)
                        .bind(item.quantity)
                        .execute(&mut **tx)
                        .await?;
                    if !aggregate.contains(&item.product_id) {
                        aggregate.push(item.product_id.clone());
                    }
                }
                None => {
                    sqlx::query(
                        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
                    )
                    .bind(&item.product_id)
                    .bind(item.quantity)
                    .bind(Utc::now())
                    .execute(&mut **tx)
                    .await?;
                }
            }
        }

        for product_id in &aggregate {
            self.recompute_aggregate_stock(tx, product_id).await?;
        }

        debug!(order_id = %order.id, lines = items.len(), "Stock restored");
        Ok(())
    }

    /// Marks an order paid and credits its earned points to the buyer.
    async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order: &Order,
    ) -> WorkflowResult<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE orders
            SET is_paid = 1, paid_at = ?2, updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(now)
        .execute(&mut **tx)
        .await?;

        if order.points_earned > 0 {
            sqlx::query(
                r#"
                UPDATE users
                SET points = points + ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&order.user_id)
            .bind(order.points_earned)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn append_history(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
        status: OrderStatus,
    ) -> WorkflowResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_status_history (id, order_id, status, changed_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(generate_id())
        .bind(order_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn set_status(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        order_id: &str,
        status: OrderStatus,
    ) -> WorkflowResult<()> {
        sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    async fn detail(&self, order_id: &str) -> WorkflowResult<OrderDetail> {
        OrderRepository::new(self.pool.clone())
            .get_detail(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id).into())
    }
}
