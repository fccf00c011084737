//! Order endpoints: creation, listing, detail, and status transitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use orchard_core::{Money, OrderDetail, OrderStatus, PaymentMethod, RequestedItem};
use orchard_db::{NewOrder, OrderQuery};

use super::Envelope;
use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Request / response shapes
// =============================================================================

/// Body of POST /orders.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<RequestedItem>,
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub discount_code: Option<String>,
    #[serde(default)]
    pub points_used: i64,
    #[serde(default)]
    pub shipping_fee: i64,
}

/// Body of PATCH /orders/:order_id/status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Query string of GET /orders/admin/all.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrdersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrdersResponse {
    pub orders: Vec<OrderDetail>,
    pub pagination: Pagination,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /orders - create an order for the authenticated user.
pub async fn create_order(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<OrderDetail>>)> {
    info!(user_id = %principal.user_id, lines = body.items.len(), "Creating order");

    let detail = state
        .db
        .workflow()
        .create_order(NewOrder {
            user_id: principal.user_id,
            items: body.items,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            discount_code: body.discount_code,
            points_used: body.points_used,
            shipping_fee: Money::from_units(body.shipping_fee),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Order created", detail)),
    ))
}

/// GET /orders - the authenticated user's orders, newest first.
pub async fn list_my_orders(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<Envelope<Vec<OrderDetail>>>> {
    let orders = state.db.orders().list_for_user(&principal.user_id).await?;
    Ok(Json(Envelope::ok("Orders", orders)))
}

/// GET /orders/:order_id - one order; owner or admin only.
pub async fn get_order(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Envelope<OrderDetail>>> {
    let detail = state
        .db
        .orders()
        .get_detail(&order_id)
        .await?
        .ok_or_else(|| ApiError::Core(orchard_core::CoreError::OrderNotFound(order_id)))?;

    if detail.order.user_id != principal.user_id && !principal.is_admin() {
        return Err(ApiError::Forbidden(
            "you do not own this order".to_string(),
        ));
    }

    Ok(Json(Envelope::ok("Order", detail)))
}

/// PATCH /orders/:order_id/status - admin-only status transition.
pub async fn update_order_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(order_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Envelope<OrderDetail>>> {
    principal.require_admin()?;

    let detail = state
        .db
        .workflow()
        .update_status(&order_id, body.status)
        .await?;

    Ok(Json(Envelope::ok("Order status updated", detail)))
}

/// GET /orders/admin/all - admin-only paginated listing with filters.
pub async fn list_all_orders(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<AdminOrdersQuery>,
) -> ApiResult<Json<Envelope<AdminOrdersResponse>>> {
    principal.require_admin()?;

    let page = state
        .db
        .orders()
        .list_all(&OrderQuery {
            page: query.page,
            limit: query.limit,
            status: query.status,
            start_date: query.start_date,
            end_date: query.end_date,
        })
        .await?;

    let total_pages = if page.total == 0 {
        0
    } else {
        (page.total + page.limit - 1) / page.limit
    };

    Ok(Json(Envelope::ok(
        "Orders",
        AdminOrdersResponse {
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages,
            },
            orders: page.orders,
        },
    )))
}
