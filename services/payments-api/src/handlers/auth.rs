//! Provider authentication passthrough

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use haru_billing_core::{PaymentGateway, PayWork};

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::record_op_duration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PayAuthRequest {
    /// Operation type: AUTH (default), PUSERDEL, PAYCANCEL
    pub work: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PayAuthResponse {
    pub auth_key: String,
}

/// POST /api/v1/pay/auth
///
/// Obtain a short-lived provider credential for the mobile client's payment
/// window. Only the authorization key travels back; partner identity stays
/// server-side.
pub async fn pay_auth(
    State(state): State<AppState>,
    Json(req): Json<PayAuthRequest>,
) -> ApiResult<Json<PayAuthResponse>> {
    let start = Instant::now();

    let work = match req.work.as_deref().unwrap_or("AUTH") {
        "AUTH" => PayWork::Auth,
        "PUSERDEL" => PayWork::PuserDel,
        "PAYCANCEL" => PayWork::PayCancel,
        other => {
            return Err(ApiError::BadRequest(format!("Invalid work type: {other}")));
        }
    };

    let auth = state.gateway.partner_auth(work).await.map_err(|e| {
        record_op_duration("pay_auth", start, false);
        ApiError::from(e)
    })?;

    record_op_duration("pay_auth", start, true);

    Ok(Json(PayAuthResponse {
        auth_key: auth.auth_key,
    }))
}
