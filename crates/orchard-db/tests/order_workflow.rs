//! End-to-end tests of the order workflow engine against an in-memory
//! SQLite database: creation, discounts, stock accounting, transitions,
//! and payment confirmation.

use chrono::Utc;

use orchard_core::{
    Coupon, CouponType, Money, OrderStatus, PaymentMethod, Product, RequestedItem, User, Variant,
};
use orchard_db::repository::generate_id;
use orchard_db::{Database, DbConfig, NewOrder, OrderWorkflow, WorkflowError};
use orchard_core::CoreError;

struct Fixture {
    db: Database,
    user_id: String,
    sneaker_id: String,
    red41_id: String,
    mug_id: String,
}

const RED41_STOCK: i64 = 5;
const BLACK42_STOCK: i64 = 3;
const MUG_STOCK: i64 = 10;
const USER_POINTS: i64 = 200;

async fn fixture() -> Fixture {
    fixture_with(DbConfig::in_memory()).await
}

async fn fixture_with(config: DbConfig) -> Fixture {
    let db = Database::new(config).await.unwrap();
    let now = Utc::now();

    let user_id = generate_id();
    db.users()
        .insert(&User {
            id: user_id.clone(),
            email: "buyer@example.com".to_string(),
            role: "user".to_string(),
            points: USER_POINTS,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let sneaker_id = generate_id();
    db.products()
        .insert(&Product {
            id: sneaker_id.clone(),
            name: "Runner Sneaker".to_string(),
            description: None,
            category_id: None,
            price_units: None,
            min_price_units: None,
            stock: 0,
            image_url: Some("https://img.example/sneaker.jpg".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let red41_id = generate_id();
    db.products()
        .insert_variant(&Variant {
            id: red41_id.clone(),
            product_id: sneaker_id.clone(),
            name: "Red / 41".to_string(),
            price_units: Money::from_units(100_000),
            stock: RED41_STOCK,
            discount_percentage: 0,
        })
        .await
        .unwrap();
    db.products()
        .insert_variant(&Variant {
            id: generate_id(),
            product_id: sneaker_id.clone(),
            name: "Black / 42".to_string(),
            price_units: Money::from_units(110_000),
            stock: BLACK42_STOCK,
            discount_percentage: 0,
        })
        .await
        .unwrap();

    let mug_id = generate_id();
    db.products()
        .insert(&Product {
            id: mug_id.clone(),
            name: "Stone Mug".to_string(),
            description: None,
            category_id: None,
            price_units: Some(Money::from_units(30_000)),
            min_price_units: None,
            stock: MUG_STOCK,
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    Fixture {
        db,
        user_id,
        sneaker_id,
        red41_id,
        mug_id,
    }
}

async fn insert_coupon(db: &Database, code: &str, kind: CouponType, value: i64, max_uses: i64) {
    let now = Utc::now();
    db.coupons()
        .insert(&Coupon {
            id: generate_id(),
            code: code.to_string(),
            value,
            kind,
            max_uses,
            current_uses: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

fn order_of(fx: &Fixture, items: Vec<RequestedItem>, method: PaymentMethod) -> NewOrder {
    NewOrder {
        user_id: fx.user_id.clone(),
        items,
        shipping_address: "12 Rue Neuve, Hanoi".to_string(),
        payment_method: method,
        discount_code: None,
        points_used: 0,
        shipping_fee: Money::from_units(20_000),
    }
}

fn variant_line(fx: &Fixture, quantity: i64) -> RequestedItem {
    RequestedItem {
        product_id: fx.sneaker_id.clone(),
        variant_id: Some(fx.red41_id.clone()),
        quantity,
    }
}

fn mug_line(fx: &Fixture, quantity: i64) -> RequestedItem {
    RequestedItem {
        product_id: fx.mug_id.clone(),
        variant_id: None,
        quantity,
    }
}

/// Retries a checkout until it settles on a domain outcome. Two writers
/// racing in WAL mode can surface SQLITE_BUSY to the loser instead of a
/// clean conflict; that attempt is simply replayed. Domain errors settle
/// the attempt immediately.
async fn create_until_settled(
    workflow: &OrderWorkflow,
    order: NewOrder,
) -> Result<(), WorkflowError> {
    for _ in 0..50 {
        match workflow.create_order(order.clone()).await {
            Ok(_) => return Ok(()),
            Err(err @ WorkflowError::Core(_)) => return Err(err),
            Err(WorkflowError::Db(_)) => tokio::task::yield_now().await,
        }
    }
    workflow.create_order(order).await.map(|_| ())
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn creates_order_with_frozen_snapshots_and_totals() {
    let fx = fixture().await;

    let detail = fx
        .db
        .workflow()
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    assert_eq!(detail.order.subtotal_units.units(), 200_000);
    assert_eq!(detail.order.shipping_fee_units.units(), 20_000);
    assert_eq!(detail.order.discount_units.units(), 0);
    assert_eq!(detail.order.total_units.units(), 220_000);
    assert_eq!(detail.order.points_earned, 22_000);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(!detail.order.is_paid);

    assert_eq!(detail.items.len(), 1);
    let item = &detail.items[0];
    assert_eq!(item.name_snapshot, "Runner Sneaker");
    assert_eq!(item.variant_snapshot.as_deref(), Some("Red / 41"));
    assert_eq!(
        item.image_snapshot.as_deref(),
        Some("https://img.example/sneaker.jpg")
    );
    assert_eq!(item.unit_price_units.units(), 100_000);
    assert_eq!(item.quantity, 2);

    let statuses: Vec<_> = detail.status_history.iter().map(|h| h.status).collect();
    assert_eq!(statuses, vec![OrderStatus::Pending]);
}

#[tokio::test]
async fn decrements_variant_stock_and_aggregate() {
    let fx = fixture().await;

    fx.db
        .workflow()
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    let entry = fx
        .db
        .products()
        .get_with_variants(&fx.sneaker_id)
        .await
        .unwrap()
        .unwrap();
    let red41 = entry.variant(&fx.red41_id).unwrap();
    assert_eq!(red41.stock, RED41_STOCK - 2);
    // Aggregate mirrors the variant sum.
    assert_eq!(entry.product.stock, (RED41_STOCK - 2) + BLACK42_STOCK);

    // Ordering never hides a product from the catalog.
    assert_eq!(fx.db.products().list_active().await.unwrap().len(), 2);
}

#[tokio::test]
async fn cod_order_advances_to_processing_immediately() {
    let fx = fixture().await;

    let detail = fx
        .db
        .workflow()
        .create_order(order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod))
        .await
        .unwrap();

    assert_eq!(detail.order.status, OrderStatus::Processing);
    assert!(!detail.order.is_paid);
    let statuses: Vec<_> = detail.status_history.iter().map(|h| h.status).collect();
    assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Processing]);
}

#[tokio::test]
async fn rejects_order_exceeding_stock() {
    let fx = fixture().await;

    let err = fx
        .db
        .workflow()
        .create_order(order_of(&fx, vec![variant_line(&fx, 6)], PaymentMethod::Cod))
        .await
        .unwrap_err();

    match err {
        WorkflowError::Core(CoreError::InsufficientStock {
            item,
            available,
            requested,
        }) => {
            assert_eq!(item, "Red / 41 of Runner Sneaker");
            assert_eq!(available, RED41_STOCK);
            assert_eq!(requested, 6);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing was written.
    let entry = fx
        .db
        .products()
        .get_with_variants(&fx.sneaker_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.variant(&fx.red41_id).unwrap().stock, RED41_STOCK);
    assert_eq!(fx.db.orders().list_for_user(&fx.user_id).await.unwrap().len(), 0);
}

#[tokio::test]
async fn sequential_orders_cannot_oversell() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 3)], PaymentMethod::Cod))
        .await
        .unwrap();

    let err = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 3)], PaymentMethod::Cod))
        .await
        .unwrap_err();

    match err {
        WorkflowError::Core(CoreError::InsufficientStock { available, .. }) => {
            assert_eq!(available, RED41_STOCK - 3)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_cannot_oversell_or_overredeem() {
    let path = std::env::temp_dir().join(format!("orchard-race-{}.db", generate_id()));
    let fx = fixture_with(DbConfig::new(&path).max_connections(8)).await;
    insert_coupon(&fx.db, "ONCE1", CouponType::Fixed, 10_000, 1).await;

    // Stock 5 and a single-use coupon: exactly one qty-3 checkout can
    // clear both guards, whatever order the writers land in.
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let db = fx.db.clone();
        let mut order = order_of(&fx, vec![variant_line(&fx, 3)], PaymentMethod::Cod);
        order.discount_code = Some("ONCE1".to_string());
        tasks.push(tokio::spawn(async move {
            create_until_settled(&db.workflow(), order).await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => successes += 1,
            Err(WorkflowError::Core(CoreError::InsufficientStock { available, .. })) => {
                assert!(available >= 0);
            }
            Err(WorkflowError::Core(CoreError::CouponNotApplicable { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);

    let entry = fx
        .db
        .products()
        .get_with_variants(&fx.sneaker_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.variant(&fx.red41_id).unwrap().stock, RED41_STOCK - 3);
    assert_eq!(entry.product.stock, (RED41_STOCK - 3) + BLACK42_STOCK);

    let coupon = fx.db.coupons().find_by_code("ONCE1").await.unwrap().unwrap();
    assert_eq!(coupon.current_uses, 1);
    assert_eq!(fx.db.orders().list_for_user(&fx.user_id).await.unwrap().len(), 1);

    fx.db.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut name = path.clone().into_os_string();
        name.push(suffix);
        let _ = std::fs::remove_file(name);
    }
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn redeems_coupon_once_per_order_with_real_order_id() {
    let fx = fixture().await;
    insert_coupon(&fx.db, "SALE1", CouponType::Percentage, 10, 5).await;

    let mut new_order = order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay);
    new_order.discount_code = Some("SALE1".to_string());

    let detail = fx.db.workflow().create_order(new_order).await.unwrap();

    assert_eq!(detail.order.discount_code.as_deref(), Some("SALE1"));
    assert_eq!(detail.order.discount_units.units(), 20_000);
    assert_eq!(detail.order.total_units.units(), 200_000);

    let coupon = fx.db.coupons().find_by_code("SALE1").await.unwrap().unwrap();
    assert_eq!(coupon.current_uses, 1);

    let redemptions = fx.db.coupons().redemptions(&coupon.id).await.unwrap();
    assert_eq!(redemptions.len(), 1);
    assert_eq!(redemptions[0].order_id, detail.order.id);
    assert_eq!(redemptions[0].user_id, fx.user_id);
}

#[tokio::test]
async fn exhausted_coupon_fails_the_whole_order() {
    let fx = fixture().await;
    insert_coupon(&fx.db, "ONCE1", CouponType::Fixed, 10_000, 1).await;
    let workflow = fx.db.workflow();

    let mut first = order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod);
    first.discount_code = Some("ONCE1".to_string());
    workflow.create_order(first).await.unwrap();

    let mut second = order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod);
    second.discount_code = Some("ONCE1".to_string());
    let err = workflow.create_order(second).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::CouponNotApplicable { .. })
    ));

    // The failed order left no trace: stock only reflects the first order.
    let mug = fx.db.products().get_by_id(&fx.mug_id).await.unwrap().unwrap();
    assert_eq!(mug.stock, MUG_STOCK - 1);
    assert_eq!(fx.db.orders().list_for_user(&fx.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_coupon_code_is_rejected() {
    let fx = fixture().await;

    let mut new_order = order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod);
    new_order.discount_code = Some("GHOST".to_string());

    let err = fx.db.workflow().create_order(new_order).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::CouponNotFound(_))
    ));
}

// =============================================================================
// Loyalty points
// =============================================================================

#[tokio::test]
async fn spending_points_debits_the_balance() {
    let fx = fixture().await;

    let mut new_order = order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay);
    new_order.points_used = 50;

    let detail = fx.db.workflow().create_order(new_order).await.unwrap();

    assert_eq!(detail.order.points_used, 50);
    assert_eq!(detail.order.discount_units.units(), 50_000);
    assert_eq!(detail.order.total_units.units(), 170_000);
    assert_eq!(detail.order.points_earned, 17_000);

    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS - 50);
}

#[tokio::test]
async fn rejects_spending_more_points_than_owned() {
    let fx = fixture().await;

    let mut new_order = order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay);
    new_order.points_used = USER_POINTS + 1;

    let err = fx.db.workflow().create_order(new_order).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::InsufficientPoints { .. })
    ));

    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS);
}

// =============================================================================
// Cart cleanup
// =============================================================================

#[tokio::test]
async fn ordering_removes_matching_cart_lines_only() {
    let fx = fixture().await;
    let carts = fx.db.carts();

    carts
        .upsert_item(&fx.user_id, &fx.sneaker_id, Some(&fx.red41_id), 2)
        .await
        .unwrap();
    carts
        .upsert_item(&fx.user_id, &fx.mug_id, None, 1)
        .await
        .unwrap();

    fx.db
        .workflow()
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Cod))
        .await
        .unwrap();

    let remaining = carts.items_for_user(&fx.user_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_id, fx.mug_id);
}

// =============================================================================
// Status transitions
// =============================================================================

#[tokio::test]
async fn cancellation_restores_stock_exactly() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Cod))
        .await
        .unwrap();

    let cancelled = workflow
        .update_status(&detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

    let entry = fx
        .db
        .products()
        .get_with_variants(&fx.sneaker_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.variant(&fx.red41_id).unwrap().stock, RED41_STOCK);
    assert_eq!(entry.product.stock, RED41_STOCK + BLACK42_STOCK);
}

#[tokio::test]
async fn cancelling_a_paid_order_refunds_spent_points() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let mut new_order = order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay);
    new_order.points_used = 50;
    let detail = workflow.create_order(new_order).await.unwrap();

    workflow.confirm_payment(&detail.order.id, true).await.unwrap();
    workflow
        .update_status(&detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    // Balance: -50 spent, +17_000 earned at payment, +50 refunded.
    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS + detail.order.points_earned);
}

#[tokio::test]
async fn cancelled_is_terminal_and_unreachable_after_shipping() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let id = detail.order.id;

    workflow.update_status(&id, OrderStatus::Shipped).await.unwrap();
    let err = workflow
        .update_status(&id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::IllegalTransition { .. })
    ));

    // Back up to PROCESSING (allowed), cancel, then nothing else sticks.
    workflow.update_status(&id, OrderStatus::Processing).await.unwrap();
    workflow.update_status(&id, OrderStatus::Cancelled).await.unwrap();
    let err = workflow
        .update_status(&id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::IllegalTransition { .. })
    ));
}

#[tokio::test]
async fn delivering_a_cod_order_settles_payment_and_credits_points() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Cod))
        .await
        .unwrap();
    let id = detail.order.id;

    workflow.update_status(&id, OrderStatus::Shipped).await.unwrap();
    let delivered = workflow
        .update_status(&id, OrderStatus::Delivered)
        .await
        .unwrap();

    assert!(delivered.order.is_paid);
    assert!(delivered.order.paid_at.is_some());

    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS + detail.order.points_earned);
}

#[tokio::test]
async fn unknown_order_transition_fails() {
    let fx = fixture().await;
    let err = fx
        .db
        .workflow()
        .update_status("ghost-order", OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Core(CoreError::OrderNotFound(_))
    ));
}

// =============================================================================
// Payment confirmation
// =============================================================================

#[tokio::test]
async fn successful_callback_pays_and_advances_pending_orders() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    let paid = workflow.confirm_payment(&detail.order.id, true).await.unwrap();
    assert!(paid.order.is_paid);
    assert_eq!(paid.order.status, OrderStatus::Processing);
    let statuses: Vec<_> = paid.status_history.iter().map(|h| h.status).collect();
    assert_eq!(statuses, vec![OrderStatus::Pending, OrderStatus::Processing]);

    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS + detail.order.points_earned);
}

#[tokio::test]
async fn repeated_success_callback_is_idempotent() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    workflow.confirm_payment(&detail.order.id, true).await.unwrap();
    let again = workflow.confirm_payment(&detail.order.id, true).await.unwrap();
    assert!(again.order.is_paid);

    // Points were credited exactly once.
    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS + detail.order.points_earned);
}

#[tokio::test]
async fn late_callback_for_a_cancelled_order_credits_nothing() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let mut new_order = order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay);
    new_order.points_used = 50;
    let detail = workflow.create_order(new_order).await.unwrap();

    workflow
        .update_status(&detail.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    // The gateway confirms after the cancellation raced ahead of it.
    let after = workflow.confirm_payment(&detail.order.id, true).await.unwrap();
    assert_eq!(after.order.status, OrderStatus::Cancelled);
    assert!(!after.order.is_paid);
    assert!(after.order.paid_at.is_none());

    // No earned points for a dead order; the unpaid cancel kept the spend.
    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS - 50);
}

#[tokio::test]
async fn failed_callback_changes_nothing() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let detail = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 2)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    let after = workflow.confirm_payment(&detail.order.id, false).await.unwrap();
    assert!(!after.order.is_paid);
    assert_eq!(after.order.status, OrderStatus::Pending);

    let user = fx.db.users().get_by_id(&fx.user_id).await.unwrap().unwrap();
    assert_eq!(user.points, USER_POINTS);
}

// =============================================================================
// Read side
// =============================================================================

#[tokio::test]
async fn lists_orders_newest_first_with_filters() {
    let fx = fixture().await;
    let workflow = fx.db.workflow();

    let first = workflow
        .create_order(order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod))
        .await
        .unwrap();
    let second = workflow
        .create_order(order_of(&fx, vec![variant_line(&fx, 1)], PaymentMethod::Vnpay))
        .await
        .unwrap();

    let own = fx.db.orders().list_for_user(&fx.user_id).await.unwrap();
    assert_eq!(own.len(), 2);
    assert_eq!(own[0].order.id, second.order.id);
    assert_eq!(own[1].order.id, first.order.id);

    let page = fx
        .db
        .orders()
        .list_all(&orchard_db::OrderQuery {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.orders[0].order.id, second.order.id);

    let page = fx
        .db
        .orders()
        .list_all(&orchard_db::OrderQuery {
            limit: Some(1),
            page: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.orders[0].order.id, first.order.id);
}

#[tokio::test]
async fn status_history_keeps_insertion_order_on_timestamp_ties() {
    let fx = fixture().await;

    // COD creation writes PENDING and PROCESSING in one transaction, so
    // the pair already shares a near-identical timestamp.
    let detail = fx
        .db
        .workflow()
        .create_order(order_of(&fx, vec![mug_line(&fx, 1)], PaymentMethod::Cod))
        .await
        .unwrap();

    // Append an entry reusing the first entry's exact timestamp with an
    // id that sorts before every generated one. The trail must still
    // come back in the order the transitions happened.
    sqlx::query(
        r#"
        INSERT INTO order_status_history (id, order_id, status, changed_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind("00000000-0000-0000-0000-000000000000")
    .bind(&detail.order.id)
    .bind(OrderStatus::Shipped.as_str())
    .bind(detail.status_history[0].changed_at)
    .execute(fx.db.pool())
    .await
    .unwrap();

    let history = fx.db.orders().history_of(&detail.order.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped
        ]
    );
}
