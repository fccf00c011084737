//! Payment gateway callback endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use orchard_core::OrderDetail;

use super::Envelope;
use crate::error::ApiResult;
use crate::AppState;

/// Body of POST /payments/callback.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackRequest {
    pub order_id: String,
    pub success: bool,
}

/// POST /payments/callback - the gateway reports the outcome of a payment.
///
/// Gateways authenticate out-of-band (shared-secret signatures at the
/// ingress), so this route takes no bearer token. Idempotent on repeated
/// success callbacks.
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(body): Json<PaymentCallbackRequest>,
) -> ApiResult<Json<Envelope<OrderDetail>>> {
    info!(order_id = %body.order_id, success = body.success, "Payment callback");

    let detail = state
        .db
        .workflow()
        .confirm_payment(&body.order_id, body.success)
        .await?;

    let message = if body.success {
        "Payment confirmed"
    } else {
        "Payment failed, order unchanged"
    };

    Ok(Json(Envelope::ok(message, detail)))
}
