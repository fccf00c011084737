//! # Error Types
//!
//! Domain-specific error types for orchard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orchard-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  orchard-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── WorkflowError    - CoreError | DbError inside a transaction       │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - HTTP status + response envelope                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → WorkflowError → ApiError → JSON   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available stock, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations inside the order
/// workflow. The API layer translates them into HTTP status codes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested variant does not exist on the product.
    #[error("Variant {variant_id} not found on product {product}")]
    VariantNotFound { product: String, variant_id: String },

    /// Insufficient stock to place the order.
    ///
    /// ## When This Occurs
    /// - A line requests more than the variant (or product) has available
    /// - A concurrent checkout consumed the stock first
    ///
    /// The message names the offending variant/product and the stock that
    /// was available so the client can adjust the cart.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        /// "variant of product" or the bare product name.
        item: String,
        available: i64,
        requested: i64,
    },

    /// Coupon code does not exist.
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Coupon exists but cannot be applied.
    ///
    /// ## When This Occurs
    /// - `is_active` is false
    /// - `current_uses` has reached `max_uses`
    /// - A concurrent checkout consumed the last use
    #[error("Coupon {code} cannot be applied: {reason}")]
    CouponNotApplicable { code: String, reason: String },

    /// User tried to spend more points than their balance.
    #[error("Insufficient points: available {available}, requested {requested}")]
    InsufficientPoints { available: i64, requested: i64 },

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Requested status is not one of the five valid states.
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    /// The state machine forbids this transition.
    ///
    /// ## When This Occurs
    /// - Any transition out of CANCELLED (terminal state)
    /// - CANCELLED requested from SHIPPED or DELIVERED
    #[error("Cannot transition order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet requirements.
/// Used for early validation before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A list field must contain at least one element.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Too many elements in a list field.
    #[error("{field} must have at most {max} entries")]
    TooMany { field: String, max: usize },

    /// Invalid format (e.g., malformed coupon code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "Red / 41 of Runner Sneaker".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Red / 41 of Runner Sneaker: available 3, requested 5"
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::IllegalTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot transition order from CANCELLED to PENDING"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must not be empty");

        let err = ValidationError::Required {
            field: "shippingAddress".to_string(),
        };
        assert_eq!(err.to_string(), "shippingAddress is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "shippingAddress".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
