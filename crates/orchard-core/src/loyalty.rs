//! # Loyalty Point Math
//!
//! Spend/earn arithmetic for the per-user loyalty balance.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Loyalty Points                                    │
//! │                                                                         │
//! │  SPEND: 1 point = 1000 currency units, offset against the subtotal     │
//! │    • requesting more points than the balance is a hard error           │
//! │    • the discount is capped at the subtotal; when capped, the          │
//! │      effective points spent shrink to floor(subtotal / 1000)           │
//! │                                                                         │
//! │  EARN: floor(totalAmount × 10%) credited when the order is paid        │
//! │    (payment callback, or COD delivery)                                  │
//! │                                                                         │
//! │  Balance invariant: points >= 0 always - enforced here by the spend    │
//! │  check and in storage by the guarded debit UPDATE                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::CoreError;
use crate::money::Money;

/// Currency value of one loyalty point when spent.
pub const POINT_VALUE_UNITS: i64 = 1000;

/// Percentage of the order total earned back as points.
pub const EARN_RATE_PCT: u32 = 10;

/// Outcome of applying points at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsApplication {
    /// Points actually spent (may be lower than requested when capped).
    pub points_used: i64,
    /// Currency discount those points are worth.
    pub discount: Money,
}

impl PointsApplication {
    /// No points spent.
    pub const fn none() -> Self {
        PointsApplication {
            points_used: 0,
            discount: Money::zero(),
        }
    }
}

/// Applies `requested` points against `subtotal` for a user holding
/// `balance` points.
///
/// ## Errors
/// - `InsufficientPoints` when `requested > balance`
///
/// ## Capping
/// The discount never exceeds the subtotal. When it would, the effective
/// points spent are reduced to `floor(subtotal / 1000)` so the user keeps
/// the points the order could not absorb.
pub fn apply_points(
    requested: i64,
    balance: i64,
    subtotal: Money,
) -> Result<PointsApplication, CoreError> {
    if requested <= 0 {
        return Ok(PointsApplication::none());
    }
    if requested > balance {
        return Err(CoreError::InsufficientPoints {
            available: balance,
            requested,
        });
    }

    let discount = Money::from_units(requested * POINT_VALUE_UNITS);
    if discount.units() > subtotal.units() {
        let capped_points = subtotal.units() / POINT_VALUE_UNITS;
        return Ok(PointsApplication {
            points_used: capped_points,
            discount: subtotal,
        });
    }

    Ok(PointsApplication {
        points_used: requested,
        discount,
    })
}

/// Points earned for a paid order: `floor(total × 10%)`, never negative.
pub fn points_earned(total: Money) -> i64 {
    total.clamp_non_negative().percentage(EARN_RATE_PCT).units()
}

// =============================================================================
// Unit Tests
// =============================================================================
