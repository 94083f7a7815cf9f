//! Renewal pass trigger

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use std::time::Instant;

use haru_billing_core::{RenewalOutcome, RenewalSummary};
use haru_db::UserRepository;

use crate::error::{ApiError, ApiResult};
use crate::handlers::shared::record_op_duration;
use crate::state::AppState;

/// POST /internal/renewal/run
///
/// Runs one renewal pass over all due subscriptions. The platform scheduler
/// invokes this; overlapping invocations are not serialized here.
pub async fn run_renewal(State(state): State<AppState>) -> ApiResult<Json<RenewalSummary>> {
    let start = Instant::now();

    let now = Utc::now();
    let summary = state
        .renewals
        .run(now.date_naive(), now)
        .await
        .map_err(|e| {
            record_op_duration("renewal_pass", start, false);
            ApiError::from(e)
        })?;

    for record in &summary.records {
        metrics::counter!(
            "payments_renewals_total",
            "outcome" => record.outcome.to_string()
        )
        .increment(1);
    }
    record_op_duration("renewal_pass", start, true);

    notify_failed(&state, &summary).await;

    Ok(Json(summary))
}

/// Payment-failed mail is best-effort and never affects the pass result.
async fn notify_failed(state: &AppState, summary: &RenewalSummary) {
    let Some(mailer) = &state.mailer else {
        return;
    };

    for record in &summary.records {
        if !matches!(
            record.outcome,
            RenewalOutcome::Failed | RenewalOutcome::Error
        ) {
            continue;
        }

        match state.repos.users.find_by_id(record.user_id).await {
            Ok(Some(user)) => {
                mailer
                    .send_best_effort(
                        &user.email,
                        "We couldn't renew your subscription",
                        "Your monthly payment didn't go through. Update your payment method in the app to keep your subscription.",
                    )
                    .await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id = %record.user_id, error = %e, "User lookup for mail failed");
            }
        }
    }
}
