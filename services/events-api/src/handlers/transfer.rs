//! Settlement transfer webhook

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use haru_db::{CreateTransferResult, TransferResultRepository};

use crate::state::AppState;

/// POST /webhooks/transfer
///
/// Records the settlement provider's transfer result into the audit table.
/// Signature verification runs when a webhook secret is configured.
pub async fn transfer_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(verifier) = &state.transfer_verifier {
        let Some(sig_header) = headers.get("x-transfer-signature") else {
            tracing::warn!("Missing transfer signature header");
            return StatusCode::BAD_REQUEST;
        };

        let Ok(signature) = sig_header.to_str() else {
            tracing::warn!("Invalid transfer signature header encoding");
            return StatusCode::BAD_REQUEST;
        };

        if let Err(e) = verifier.verify(&body, signature) {
            tracing::error!(error = %e, "Transfer webhook verification failed");
            metrics::counter!("events_transfer_webhooks_total", "status" => "rejected")
                .increment(1);
            return StatusCode::BAD_REQUEST;
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Transfer webhook body is not JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    // Settlement sub-API uses plain field names
    let provider_code = payload
        .get("result")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    match state
        .repos
        .transfer_results
        .append(CreateTransferResult {
            id: Uuid::new_v4(),
            provider_code,
            payload,
        })
        .await
    {
        Ok(_) => {
            metrics::counter!("events_transfer_webhooks_total", "status" => "recorded")
                .increment(1);
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record transfer result");
            metrics::counter!("events_transfer_webhooks_total", "status" => "error").increment(1);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
