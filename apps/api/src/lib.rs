//! # Orchard Commerce API
//!
//! Thin axum layer over the order workflow engine.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         HTTP Request                                    │
//! │                              │                                          │
//! │   Principal extractor ───────┤  (bearer token → user id + role)        │
//! │                              ▼                                          │
//! │   Handler (routes/)  ── shapes request, checks ownership/role          │
//! │                              │                                          │
//! │                              ▼                                          │
//! │   OrderWorkflow / repositories (orchard-db)                            │
//! │                              │                                          │
//! │                              ▼                                          │
//! │   Envelope { success, message, data } ── ApiError maps failures        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use axum::routing::{get, patch, post};
use axum::Router;

use orchard_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        AppState {
            jwt: JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs),
            db,
        }
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/orders",
            post(routes::orders::create_order).get(routes::orders::list_my_orders),
        )
        .route("/orders/admin/all", get(routes::orders::list_all_orders))
        .route("/orders/:order_id", get(routes::orders::get_order))
        .route(
            "/orders/:order_id/status",
            patch(routes::orders::update_order_status),
        )
        .route("/payments/callback", post(routes::payments::payment_callback))
        .with_state(state)
}
