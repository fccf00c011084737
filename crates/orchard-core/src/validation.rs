//! # Input Validation Rules
//!
//! Early request validation, run before any state is read or written.
//! Each rule returns a typed [`ValidationError`] naming the field.

use crate::checkout::RequestedItem;
use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Validates the shape of an order-creation request.
///
/// ## Checks (fail fast, no mutation has happened yet)
/// - `items` non-empty, bounded, every quantity positive and bounded
/// - `shippingAddress` present and non-blank
/// - `pointsUsed` not negative
/// - `shippingFee` not negative
pub fn validate_order_request(
    items: &[RequestedItem],
    shipping_address: &str,
    points_used: i64,
    shipping_fee: i64,
) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_ORDER_LINES,
        });
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "items.productId".to_string(),
            });
        }
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "items.quantity".to_string(),
            });
        }
        if item.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "items.quantity".to_string(),
                min: 1,
                max: MAX_LINE_QUANTITY,
            });
        }
    }
    if shipping_address.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "shippingAddress".to_string(),
        });
    }
    if points_used < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "pointsUsed".to_string(),
        });
    }
    if shipping_fee < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "shippingFee".to_string(),
        });
    }
    Ok(())
}

/// Validates a coupon code: exactly 5 uppercase alphanumeric characters.
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    let well_formed =
        code.len() == 5 && code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be 5 uppercase alphanumeric characters".to_string(),
        })
    }
}

/// Validates a coupon's `max_uses` bound (1-10).
pub fn validate_coupon_max_uses(max_uses: i64) -> Result<(), ValidationError> {
    if (1..=10).contains(&max_uses) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: "maxUses".to_string(),
            min: 1,
            max: 10,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: &str, quantity: i64) -> RequestedItem {
        RequestedItem {
            product_id: product_id.to_string(),
            variant_id: None,
            quantity,
        }
    }

    #[test]
    fn test_valid_request() {
        let items = vec![item("p1", 2)];
        assert!(validate_order_request(&items, "12 Rue Neuve, Hanoi", 0, 20_000).is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = validate_order_request(&[], "addr", 0, 0).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn test_blank_address_rejected() {
        let items = vec![item("p1", 1)];
        let err = validate_order_request(&items, "   ", 0, 0).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let items = vec![item("p1", 0)];
        let err = validate_order_request(&items, "addr", 0, 0).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_negative_points_rejected() {
        let items = vec![item("p1", 1)];
        let err = validate_order_request(&items, "addr", -1, 0).unwrap_err();
        assert!(matches!(err, ValidationError::MustBeNonNegative { .. }));
    }

    #[test]
    fn test_coupon_code_format() {
        assert!(validate_coupon_code("SALE1").is_ok());
        assert!(validate_coupon_code("AB1CD").is_ok());
        assert!(validate_coupon_code("sale1").is_err());
        assert!(validate_coupon_code("SALE").is_err());
        assert!(validate_coupon_code("SALE10").is_err());
        assert!(validate_coupon_code("SA-E1").is_err());
    }

    #[test]
    fn test_coupon_max_uses_bounds() {
        assert!(validate_coupon_max_uses(1).is_ok());
        assert!(validate_coupon_max_uses(10).is_ok());
        assert!(validate_coupon_max_uses(0).is_err());
        assert!(validate_coupon_max_uses(11).is_err());
    }
}
