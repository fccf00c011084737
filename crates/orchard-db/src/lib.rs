//! # orchard-db: Database Layer for Orchard Commerce
//!
//! SQLite persistence via sqlx: connection pool, embedded migrations,
//! repositories, and the transactional order workflow engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Orchard Commerce Data Flow                          │
//! │                                                                         │
//! │  HTTP handler (POST /orders)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    orchard-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │ Repositories  │   │ OrderWorkflow│    │   │
//! │  │   │   (pool.rs)   │   │ product/order │   │ (workflow.rs)│    │   │
//! │  │   │               │◄──│ coupon/user   │◄──│ one tx per   │    │   │
//! │  │   │ SqlitePool    │   │ cart          │   │ operation    │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode, foreign keys on)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`workflow`] - The order workflow engine (create / transition / payment)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod workflow;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use workflow::{NewOrder, OrderWorkflow, WorkflowError, WorkflowResult};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::coupon::CouponRepository;
pub use repository::order::{OrderPage, OrderQuery, OrderRepository};
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
