//! # Order Status State Machine
//!
//! The five order states and the transition rules between them.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Status Transitions                            │
//! │                                                                         │
//! │   PENDING ──► PROCESSING ──► SHIPPED ──► DELIVERED                     │
//! │      │             │                                                    │
//! │      │             │                                                    │
//! │      └─────────────┴────────► CANCELLED  (terminal)                    │
//! │                                                                         │
//! │   Rules:                                                                │
//! │   • CANCELLED is terminal: nothing leaves it                           │
//! │   • CANCELLED is reachable only from PENDING / PROCESSING              │
//! │   • Every other pair of valid states is accepted - the engine does     │
//! │     NOT enforce strict forward ordering (SHIPPED → PENDING is legal,   │
//! │     matching the permissive behavior this platform ships with)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Order created, payment not yet confirmed.
    Pending,
    /// Payment confirmed (or COD accepted); being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled; stock restored. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// All valid states, for error messages and request validation.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the canonical uppercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Checks whether a transition from `self` to `target` is legal.
    ///
    /// ## Rules
    /// 1. CANCELLED is terminal - no transition out of it.
    /// 2. CANCELLED can only be entered from PENDING or PROCESSING.
    /// 3. Every other transition between valid states is accepted.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if *self == OrderStatus::Cancelled {
            return false;
        }
        if target == OrderStatus::Cancelled {
            return matches!(self, OrderStatus::Pending | OrderStatus::Processing);
        }
        true
    }

    /// Validates a transition, returning a typed error when it is illegal.
    pub fn check_transition(&self, target: OrderStatus) -> Result<(), CoreError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(CoreError::IllegalTransition {
                from: *self,
                to: target,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
