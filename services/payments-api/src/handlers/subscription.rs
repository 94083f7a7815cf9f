//! Subscription handlers

use axum::extract::State;
use axum::response::Html;
use axum::{Form, Json};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

use haru_billing_core::{PassCallback, RegisterBillingKey};
use haru_types::{PayMethod, PayMethodKind, PendingOrderStatus};

use crate::error::{ApiError, ApiResult};
use crate::extractors::AuthedUser;
use crate::handlers::shared::{payload_params, record_op_duration, redirect_html};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: &'static str,
}

/// POST /api/v1/subscription/cancel
///
/// Deletes the caller's billing key at the provider and moves the
/// subscription to `canceled`; the paid period keeps running until the
/// renewal pass expires it.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthedUser,
) -> ApiResult<Json<CancelResponse>> {
    let start = Instant::now();

    state.subscriptions.cancel(user.uuid()).await.map_err(|e| {
        record_op_duration("cancel_subscription", start, false);
        ApiError::from(e)
    })?;

    metrics::counter!("payments_subscriptions_canceled_total").increment(1);
    record_op_duration("cancel_subscription", start, true);

    tracing::info!(user_id = %user.user_id, "Subscription canceled");

    Ok(Json(CancelResponse { status: "canceled" }))
}

/// POST /callbacks/billing-key
///
/// The provider posts the billing-key registration result here; the first
/// month is charged during registration. A failed registration changes
/// nothing and simply bounces the result back to the app.
pub async fn billing_key_callback(
    State(state): State<AppState>,
    Form(callback): Form<PassCallback>,
) -> ApiResult<Html<String>> {
    let start = Instant::now();

    let payload =
        serde_json::to_value(&callback).map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut params = payload_params(&payload);

    if !callback.is_success() {
        tracing::info!(code = %callback.pay_code, "Billing key registration failed at provider");
        record_op_duration("register_billing_key", start, false);
        params.push(("status".to_string(), PendingOrderStatus::Failed.to_string()));
        return Ok(redirect_html(&state.config.app_scheme, &params));
    }

    if callback.payer_id.is_empty() {
        return Err(ApiError::BadRequest(
            "Registration callback carries no billing key".into(),
        ));
    }

    let user_id = callback.user_id()?;
    let amount = callback
        .amount()
        .unwrap_or(state.config.billing.monthly_price);

    let pay_method = (!callback.card_name.is_empty()).then(|| PayMethod {
        kind: PayMethodKind::Card,
        issuer: callback.card_name.clone(),
        masked_number: callback.card_num.clone(),
    });

    let req = RegisterBillingKey {
        user_id,
        billing_key: callback.payer_id.clone(),
        order_ref: callback.pay_oid.clone(),
        amount,
        provider_code: callback.pay_code.clone(),
        message: callback.pay_msg.clone(),
        pay_method,
    };

    let now = Utc::now();
    state
        .subscriptions
        .register_billing_key(req, now.date_naive(), now)
        .await
        .map_err(|e| {
            record_op_duration("register_billing_key", start, false);
            ApiError::from(e)
        })?;

    metrics::counter!("payments_billing_keys_registered_total").increment(1);
    record_op_duration("register_billing_key", start, true);

    params.push(("status".to_string(), PendingOrderStatus::Success.to_string()));
    Ok(redirect_html(&state.config.app_scheme, &params))
}
