//! # Checkout Planner
//!
//! Pure computation of everything an order creation will write.
//!
//! ## Why a Plan?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Plan / Execute Split                                 │
//! │                                                                         │
//! │  Workflow engine (orchard-db)            Planner (this module)         │
//! │  ──────────────────────────────          ─────────────────────────     │
//! │  BEGIN TRANSACTION                                                      │
//! │  load products + coupon + user ────────► plan(request, catalog, ...)   │
//! │                                          │  group lines by product     │
//! │                                          │  check + decrement stock    │
//! │                                          │  freeze line snapshots      │
//! │                                          │  coupon & point discounts   │
//! │                                          │  totals + earned points     │
//! │  execute plan ◄──────────────────────────┘ (CheckoutPlan)              │
//! │  COMMIT (or roll back everything)                                       │
//! │                                                                         │
//! │  The planner never touches storage, so every pricing rule is unit      │
//! │  testable without a database, and the workflow stays a thin executor.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coupon::Coupon;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::loyalty::{self, PointsApplication};
use crate::money::Money;
use crate::types::ProductWithVariants;

// =============================================================================
// Request
// =============================================================================

/// One requested line: a product, an optional variant, and a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

/// Everything the planner needs, already loaded inside the transaction.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub items: &'a [RequestedItem],
    /// Distinct products referenced by `items`, with their variants.
    pub catalog: &'a [ProductWithVariants],
    /// Coupon matching the request's discount code, when one was given.
    pub coupon: Option<&'a Coupon>,
    /// Points the user asked to spend.
    pub points_requested: i64,
    /// The user's current point balance (checked only when spending).
    pub points_balance: i64,
    pub shipping_fee: Money,
}

// =============================================================================
// Plan
// =============================================================================

/// A frozen line-item snapshot to persist on the order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSnapshot {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub variant_name: Option<String>,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
}

/// One stock decrement to execute (per requested line, in request order).
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub product_id: String,
    /// `None` decrements the product's own stock (no-variant purchase).
    pub variant_id: Option<String>,
    pub quantity: i64,
}

/// The complete, side-effect-free result of planning a checkout.
#[derive(Debug, Clone)]
pub struct CheckoutPlan {
    pub lines: Vec<LineSnapshot>,
    pub stock_changes: Vec<StockChange>,
    /// Products whose aggregate stock must be recomputed from variants.
    pub aggregate_products: Vec<String>,
    pub subtotal: Money,
    pub coupon_discount: Money,
    pub points: PointsApplication,
    pub shipping_fee: Money,
    /// `coupon_discount + points.discount`.
    pub discount_total: Money,
    /// `subtotal + shipping_fee - discount_total`. Fixed at creation.
    pub total: Money,
    /// `floor(total × 10%)`, credited when the order is paid.
    pub points_earned: i64,
}

/// Plans a checkout. Pure function: validates stock against the loaded
/// catalog, freezes line snapshots, and computes every total the order
/// record will carry. Fails atomically - an error means nothing may be
/// written.
pub fn plan(request: &CheckoutRequest<'_>) -> CoreResult<CheckoutPlan> {
    let by_id: HashMap<&str, &ProductWithVariants> = request
        .catalog
        .iter()
        .map(|p| (p.product.id.as_str(), p))
        .collect();

    // Remaining stock per (product, variant) while planning, so several
    // lines against the same variant validate cumulatively.
    let mut remaining: HashMap<(&str, Option<&str>), i64> = HashMap::new();

    let mut lines = Vec::with_capacity(request.items.len());
    let mut stock_changes = Vec::with_capacity(request.items.len());
    let mut aggregate_products: Vec<String> = Vec::new();
    let mut subtotal = Money::zero();

    // Group lines by product so each product is resolved once, preserving
    // request order within the walk.
    let mut order_of_products: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&RequestedItem>> = HashMap::new();
    for item in request.items {
        let entry = grouped.entry(item.product_id.as_str()).or_default();
        if entry.is_empty() {
            order_of_products.push(item.product_id.as_str());
        }
        entry.push(item);
    }

    for product_id in order_of_products {
        let entry = by_id
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        let product = &entry.product;

        for item in &grouped[product_id] {
            let (unit_price, variant_name, available_key) = match &item.variant_id {
                Some(variant_id) => {
                    let variant = entry.variant(variant_id).ok_or_else(|| {
                        CoreError::VariantNotFound {
                            product: product.name.clone(),
                            variant_id: variant_id.clone(),
                        }
                    })?;
                    let key = (product_id, Some(variant.id.as_str()));
                    remaining.entry(key).or_insert(variant.stock);
                    (variant.price_units, Some(variant.name.clone()), key)
                }
                None => {
                    let price = product.effective_price().ok_or_else(|| {
                        CoreError::Validation(ValidationError::InvalidFormat {
                            field: "price".to_string(),
                            reason: format!("product {} has no price", product.name),
                        })
                    })?;
                    let key = (product_id, None);
                    remaining.entry(key).or_insert(product.stock);
                    (price, None, key)
                }
            };

            let available = remaining[&available_key];
            if available < item.quantity {
                let item_name = match &variant_name {
                    Some(v) => format!("{} of {}", v, product.name),
                    None => product.name.clone(),
                };
                return Err(CoreError::InsufficientStock {
                    item: item_name,
                    available,
                    requested: item.quantity,
                });
            }
            if let Some(left) = remaining.get_mut(&available_key) {
                *left -= item.quantity;
            }

            lines.push(LineSnapshot {
                product_id: product.id.clone(),
                variant_id: item.variant_id.clone(),
                name: product.name.clone(),
                variant_name,
                image: product.image_url.clone(),
                unit_price,
                quantity: item.quantity,
            });
            stock_changes.push(StockChange {
                product_id: product.id.clone(),
                variant_id: item.variant_id.clone(),
                quantity: item.quantity,
            });
            subtotal += unit_price.multiply_quantity(item.quantity);
        }

        // Aggregate stock mirrors the variant sum; only products that have
        // variants carry the derived field.
        if !entry.variants.is_empty() {
            aggregate_products.push(product.id.clone());
        }
    }

    let coupon_discount = match request.coupon {
        Some(coupon) => {
            if !coupon.is_valid() {
                return Err(CoreError::CouponNotApplicable {
                    code: coupon.code.clone(),
                    reason: coupon.rejection_reason().to_string(),
                });
            }
            coupon.calculate_discount(subtotal)
        }
        None => Money::zero(),
    };

    let points = loyalty::apply_points(
        request.points_requested,
        request.points_balance,
        subtotal,
    )?;

    let discount_total = coupon_discount + points.discount;
    let total = subtotal + request.shipping_fee - discount_total;
    let points_earned = loyalty::points_earned(total);

    Ok(CheckoutPlan {
        lines,
        stock_changes,
        aggregate_products,
        subtotal,
        coupon_discount,
        points,
        shipping_fee: request.shipping_fee,
        discount_total,
        total,
        points_earned,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupon::CouponType;
    use crate::types::{Product, Variant};
    use chrono::Utc;

    fn catalog_entry(
        id: &str,
        name: &str,
        price: Option<i64>,
        stock: i64,
        variants: Vec<Variant>,
    ) -> ProductWithVariants {
        ProductWithVariants {
            product: Product {
                id: id.to_string(),
                name: name.to_string(),
                description: None,
                category_id: None,
                price_units: price.map(Money::from_units),
                min_price_units: None,
                stock,
                image_url: Some("https://img.example/first.jpg".to_string()),
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            variants,
        }
    }

    fn variant(id: &str, product_id: &str, name: &str, price: i64, stock: i64) -> Variant {
        Variant {
            id: id.to_string(),
            product_id: product_id.to_string(),
            name: name.to_string(),
            price_units: Money::from_units(price),
            stock,
            discount_percentage: 0,
        }
    }

    fn coupon(kind: CouponType, value: i64) -> Coupon {
        Coupon {
            id: "c1".to_string(),
            code: "SALE1".to_string(),
            value,
            kind,
            max_uses: 1,
            current_uses: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn items(specs: &[(&str, Option<&str>, i64)]) -> Vec<RequestedItem> {
        specs
            .iter()
            .map(|(p, v, q)| RequestedItem {
                product_id: p.to_string(),
                variant_id: v.map(str::to_string),
                quantity: *q,
            })
            .collect()
    }

    /// Scenario A: 2 units of a 100_000 variant, fee 20_000, no discounts.
    #[test]
    fn test_plain_variant_checkout() {
        let catalog = vec![catalog_entry(
            "p1",
            "Runner Sneaker",
            None,
            5,
            vec![variant("v1", "p1", "Red / 41", 100_000, 5)],
        )];
        let requested = items(&[("p1", Some("v1"), 2)]);
        let plan = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::from_units(20_000),
        })
        .unwrap();

        assert_eq!(plan.subtotal.units(), 200_000);
        assert_eq!(plan.discount_total.units(), 0);
        assert_eq!(plan.total.units(), 220_000);
        assert_eq!(plan.points_earned, 22_000);
        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].variant_name.as_deref(), Some("Red / 41"));
        assert_eq!(
            plan.lines[0].image.as_deref(),
            Some("https://img.example/first.jpg")
        );
        assert_eq!(plan.stock_changes[0].quantity, 2);
        assert_eq!(plan.aggregate_products, vec!["p1".to_string()]);
    }

    /// Scenario B: 10% coupon on a 200_000 subtotal.
    #[test]
    fn test_percentage_coupon() {
        let catalog = vec![catalog_entry(
            "p1",
            "Runner Sneaker",
            None,
            5,
            vec![variant("v1", "p1", "Red / 41", 100_000, 5)],
        )];
        let sale = coupon(CouponType::Percentage, 10);
        let requested = items(&[("p1", Some("v1"), 2)]);
        let plan = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: Some(&sale),
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap();

        assert_eq!(plan.coupon_discount.units(), 20_000);
        assert_eq!(plan.total.units(), 180_000);
    }

    #[test]
    fn test_exhausted_coupon_rejected() {
        let catalog = vec![catalog_entry("p1", "Mug", Some(50_000), 5, vec![])];
        let mut sale = coupon(CouponType::Percentage, 10);
        sale.current_uses = sale.max_uses;
        let requested = items(&[("p1", None, 1)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: Some(&sale),
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::CouponNotApplicable { .. }));
    }

    /// Scenario C: point spend capping against a small subtotal.
    #[test]
    fn test_points_capped_at_subtotal() {
        let catalog = vec![catalog_entry("p1", "Mug", Some(30_000), 5, vec![])];
        let requested = items(&[("p1", None, 1)]);
        let plan = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 50,
            points_balance: 50,
            shipping_fee: Money::zero(),
        })
        .unwrap();

        assert_eq!(plan.points.discount.units(), 30_000);
        assert_eq!(plan.points.points_used, 30);
        assert_eq!(plan.total.units(), 0);
    }

    #[test]
    fn test_insufficient_points_rejected() {
        let catalog = vec![catalog_entry("p1", "Mug", Some(30_000), 5, vec![])];
        let requested = items(&[("p1", None, 1)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 60,
            points_balance: 50,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPoints { .. }));
    }

    #[test]
    fn test_insufficient_stock_names_the_variant() {
        let catalog = vec![catalog_entry(
            "p1",
            "Runner Sneaker",
            None,
            3,
            vec![variant("v1", "p1", "Red / 41", 100_000, 3)],
        )];
        let requested = items(&[("p1", Some("v1"), 5)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        match err {
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => {
                assert_eq!(item, "Red / 41 of Runner Sneaker");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_lines_validate_cumulatively() {
        // Two lines on the same variant (3 + 3) against stock 5: the
        // second line must see the first decrement.
        let catalog = vec![catalog_entry(
            "p1",
            "Runner Sneaker",
            None,
            5,
            vec![variant("v1", "p1", "Red / 41", 100_000, 5)],
        )];
        let requested = items(&[("p1", Some("v1"), 3), ("p1", Some("v1"), 3)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        match err {
            CoreError::InsufficientStock { available, .. } => assert_eq!(available, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_product_and_variant() {
        let catalog = vec![catalog_entry("p1", "Mug", Some(30_000), 5, vec![])];

        let requested = items(&[("ghost", None, 1)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));

        let requested = items(&[("p1", Some("ghost-variant"), 1)]);
        let err = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: None,
            points_requested: 0,
            points_balance: 0,
            shipping_fee: Money::zero(),
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::VariantNotFound { .. }));
    }

    /// Invariant: total == subtotal + fee - discount for stacked discounts.
    #[test]
    fn test_total_invariant_with_stacked_discounts() {
        let catalog = vec![catalog_entry(
            "p1",
            "Runner Sneaker",
            None,
            5,
            vec![variant("v1", "p1", "Red / 41", 100_000, 5)],
        )];
        let sale = coupon(CouponType::Fixed, 50_000);
        let requested = items(&[("p1", Some("v1"), 2)]);
        let plan = plan(&CheckoutRequest {
            items: &requested,
            catalog: &catalog,
            coupon: Some(&sale),
            points_requested: 10,
            points_balance: 100,
            shipping_fee: Money::from_units(20_000),
        })
        .unwrap();

        assert_eq!(
            plan.total,
            plan.subtotal + plan.shipping_fee - plan.discount_total
        );
        assert_eq!(plan.discount_total.units(), 50_000 + 10_000);
    }
}
