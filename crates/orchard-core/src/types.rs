//! # Domain Types
//!
//! Core domain types shared across the workflow engine and the API.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price/stock    │   │  totals/status  │   │  points         │       │
//! │  │  + Variant[]    │   │  + OrderItem[]  │   │  role           │       │
//! │  └─────────────────┘   │  + history[]    │   └─────────────────┘       │
//! │                        └─────────────────┘                             │
//! │                                                                         │
//! │  OrderItem is a FROZEN SNAPSHOT: name, unit price, variant label and   │
//! │  image are copied at checkout time. Catalog edits after purchase       │
//! │  never alter historical orders.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::OrderStatus;

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    /// Cash on delivery. Auto-advances the order to PROCESSING at creation.
    Cod,
    /// External gateway; paid when the callback confirms the transaction.
    Vnpay,
    /// Prepaid wallet balance.
    Wallet,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cod
    }
}

// =============================================================================
// Product & Variant
// =============================================================================

/// A catalog product.
///
/// `stock` is a derived aggregate: whenever variants exist it equals
/// `sum(variants[].stock)` and is recomputed by the same transaction that
/// mutates a variant's stock. It is never written independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    /// Base price. May be unset when variants carry all pricing.
    pub price_units: Option<Money>,
    /// Lowest variant price, used as the fallback when `price_units` is unset.
    pub min_price_units: Option<Money>,
    /// Aggregate stock (see type docs).
    pub stock: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price charged when ordering the product without a variant.
    /// Falls back to `min_price_units` when the base price is unset.
    pub fn effective_price(&self) -> Option<Money> {
        self.price_units.or(self.min_price_units)
    }
}

/// A purchasable sub-configuration of a product (e.g., color/size)
/// with its own price and stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub price_units: Money,
    pub stock: i64,
    pub discount_percentage: i64,
}

/// A product together with its variants, as the checkout planner sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithVariants {
    pub product: Product,
    pub variants: Vec<Variant>,
}

impl ProductWithVariants {
    /// Looks up a variant by id.
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

// =============================================================================
// Order
// =============================================================================

/// The central transactional record.
///
/// `total_units = subtotal_units + shipping_fee_units - discount_units`
/// holds at creation time and is never recomputed afterward. Orders are a
/// permanent ledger and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub discount_code: Option<String>,
    pub discount_units: Money,
    pub points_used: i64,
    pub points_earned: i64,
    pub subtotal_units: Money,
    pub shipping_fee_units: Money,
    pub total_units: Money,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item in an order.
///
/// ## Snapshot Pattern
/// Name, unit price, variant label and image are frozen copies taken at
/// checkout. `product_id`/`variant_id` are kept only so cancellation can
/// restore the exact stock row - they are never re-joined to render the
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Product name at time of purchase (frozen).
    pub name_snapshot: String,
    /// Variant label at time of purchase (frozen).
    pub variant_snapshot: Option<String>,
    /// First product image at time of purchase (frozen).
    pub image_snapshot: Option<String>,
    /// Unit price at time of purchase (frozen).
    pub unit_price_units: Money,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price_units.multiply_quantity(self.quantity)
    }
}

/// One entry in an order's append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub id: String,
    pub order_id: String,
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// An order with its line items and status history, as returned to clients.
///
/// Invariant: `order.status` equals the status of the last history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<StatusEntry>,
}

// =============================================================================
// User (loyalty-relevant slice)
// =============================================================================

/// The slice of the account entity the workflow touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: String,
    /// Loyalty balance; never negative.
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// A line in a user's cart. Removed automatically when the same
/// (product, variant) pair is successfully ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
