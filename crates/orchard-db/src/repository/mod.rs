//! # Repository Implementations
//!
//! One repository per aggregate. Repositories own the plain reads and
//! inserts; every mutation with a business precondition (stock, coupon
//! uses, point balances, status) goes through [`crate::workflow`] so it
//! runs inside a single transaction.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod user;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
