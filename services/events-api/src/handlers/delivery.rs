//! Delivery tracking webhook

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeliveryWebhook {
    pub carrier_id: String,
    pub tracking_number: String,
}

/// POST /webhooks/delivery
///
/// Acknowledges immediately so the upstream does not retry, then queries the
/// tracking provider and updates matching orders in the background. A
/// tracking number nobody ordered with is a silent no-op.
pub async fn delivery_webhook(
    State(state): State<AppState>,
    Json(req): Json<DeliveryWebhook>,
) -> StatusCode {
    if req.carrier_id.is_empty() || req.tracking_number.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    let tracker = state.tracker.clone();
    tokio::spawn(async move {
        match tracker
            .update_orders(&req.carrier_id, &req.tracking_number)
            .await
        {
            Ok(updated) => {
                metrics::counter!("events_delivery_updates_total", "result" => "ok")
                    .increment(1);
                tracing::debug!(updated, "Delivery webhook processed");
            }
            Err(e) => {
                metrics::counter!("events_delivery_updates_total", "result" => "err")
                    .increment(1);
                tracing::warn!(
                    carrier_id = %req.carrier_id,
                    tracking_number = %req.tracking_number,
                    error = %e,
                    "Delivery webhook processing failed"
                );
            }
        }
    });

    StatusCode::OK
}
