//! # Coupon Entity
//!
//! Coupon validity and discount computation.
//!
//! ## Redemption Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Coupon Redemption Flow                              │
//! │                                                                         │
//! │  Checkout request with discountCode                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  is_valid()?  ── no ──► CouponNotApplicable (whole checkout aborts)     │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  calculate_discount(subtotal)   ← pure, NO side effects                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Workflow commits the order AND, in the same transaction:               │
//! │    UPDATE coupons SET current_uses = current_uses + 1                   │
//! │      WHERE is_active = 1 AND current_uses < max_uses                    │
//! │    INSERT coupon_redemptions (coupon, order, user, used_at)             │
//! │                                                                         │
//! │  One reservation, carrying the real order id. There is no provisional   │
//! │  usedBy record to finalize later, so two concurrent checkouts by the    │
//! │  same user can never claim each other's reservation.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Coupon Type
// =============================================================================

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum CouponType {
    /// `value` is a percentage of the subtotal (clamped to 100).
    Percentage,
    /// `value` is a flat amount (clamped to the subtotal).
    Fixed,
}

// =============================================================================
// Coupon
// =============================================================================

/// A promotional code.
///
/// `code` is 5 uppercase alphanumeric characters; `max_uses` is 1-10.
/// `current_uses` counts finalized redemptions and only ever advances
/// inside the order-creation transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub value: i64,
    pub kind: CouponType,
    pub max_uses: i64,
    pub current_uses: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    /// A coupon is valid iff it is active and has uses remaining.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_active && self.current_uses < self.max_uses
    }

    /// Human-readable reason a coupon cannot be applied.
    pub fn rejection_reason(&self) -> &'static str {
        if !self.is_active {
            "coupon is inactive"
        } else {
            "coupon has reached its maximum uses"
        }
    }

    /// Computes the discount for `amount`. Pure function, no side effects.
    ///
    /// - PERCENTAGE: `amount * min(value, 100) / 100`
    /// - FIXED: `min(value, amount)` - a fixed coupon never discounts more
    ///   than the subtotal
    pub fn calculate_discount(&self, amount: Money) -> Money {
        match self.kind {
            CouponType::Percentage => {
                let pct = self.value.clamp(0, 100) as u32;
                amount.percentage(pct)
            }
            CouponType::Fixed => Money::from_units(self.value).min(amount),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
