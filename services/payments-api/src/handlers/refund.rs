//! Refund handler

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use haru_db::UserRepository;
use haru_types::OrderId;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthedUser;
use crate::handlers::shared::record_op_duration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct RefundResponse {
    pub status: &'static str,
}

/// POST /api/v1/refund
///
/// Refund an order the caller owns. The provider call happens first; only a
/// confirmed refund restores stock and removes the order.
pub async fn refund(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(req): Json<RefundRequest>,
) -> ApiResult<Json<RefundResponse>> {
    let start = Instant::now();

    let order_id = OrderId::parse(&req.order_id)
        .map_err(|_| ApiError::BadRequest("Invalid order_id".to_string()))?;

    state
        .refunds
        .refund(user.uuid(), order_id.0)
        .await
        .map_err(|e| {
            record_op_duration("refund", start, false);
            ApiError::from(e)
        })?;

    metrics::counter!("payments_refunds_total").increment(1);
    record_op_duration("refund", start, true);

    tracing::info!(user_id = %user.user_id, order_id = %order_id, "Order refunded");

    // Confirmation mail is best-effort; the refund already happened
    if let Some(mailer) = &state.mailer {
        if let Ok(Some(owner)) = state.repos.users.find_by_id(user.uuid()).await {
            mailer
                .send_best_effort(
                    &owner.email,
                    "Your refund is on its way",
                    "Your order was refunded. The amount will arrive through your original payment method.",
                )
                .await;
        }
    }

    Ok(Json(RefundResponse { status: "refunded" }))
}
