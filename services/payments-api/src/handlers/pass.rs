//! One-time payment handlers (Pass flow)

use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use haru_billing_core::PassCallback;

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthedUser;
use crate::handlers::shared::{
    payload_params, record_op_duration, redirect_html, validate_amount, validate_order_ref,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePendingRequest {
    pub payment_oid: String,
    pub goods_name: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatePendingResponse {
    pub id: String,
    pub status: String,
}

/// POST /api/v1/orders/pending
///
/// Stage a pending order before the client opens the provider's payment
/// window; the callback joins back on (user id, payment oid).
pub async fn create_pending(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(req): Json<CreatePendingRequest>,
) -> ApiResult<Json<CreatePendingResponse>> {
    let start = Instant::now();

    validate_order_ref(&req.payment_oid)?;
    validate_amount(req.amount)?;

    let row = state
        .pass
        .create_pending(user.uuid(), req.payment_oid, req.goods_name, req.amount)
        .await?;

    record_op_duration("create_pending", start, true);

    Ok(Json(CreatePendingResponse {
        id: row.id.to_string(),
        status: row.status,
    }))
}

/// POST /callbacks/pass
///
/// The provider posts the payment result here after the user finishes the
/// Pass window. The response is an HTML snippet that bounces the mobile
/// client back into the app with the result fields as query parameters —
/// for failed payments too; the client decides what to render.
pub async fn pass_callback(
    State(state): State<AppState>,
    Form(callback): Form<PassCallback>,
) -> ApiResult<Html<String>> {
    let start = Instant::now();

    let outcome = state.pass.confirm(&callback).await.map_err(|e| {
        record_op_duration("pass_confirm", start, false);
        ApiError::from(e)
    })?;

    metrics::counter!(
        "payments_pass_confirmations_total",
        "status" => outcome.status.to_string()
    )
    .increment(1);
    record_op_duration("pass_confirm", start, true);

    let payload = serde_json::to_value(&callback)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut params = payload_params(&payload);
    params.push(("status".to_string(), outcome.status.to_string()));

    Ok(redirect_html(&state.config.app_scheme, &params))
}
