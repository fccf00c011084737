//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::Envelope;
use crate::AppState;

/// GET /health - liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Envelope<()>>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(Envelope::message("ok")))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Envelope {
                success: false,
                message: "database unreachable".to_string(),
                data: None,
            }),
        )
    }
}
