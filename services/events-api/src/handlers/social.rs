//! Social notification triggers

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use haru_events_core::{NotifyOutcome, PostSnapshot};

use crate::error::ApiResult;
use crate::state::AppState;

/// Before/after document pair delivered by the store's change trigger
#[derive(Debug, Deserialize)]
pub struct SnapshotChange {
    pub before: PostSnapshot,
    pub after: PostSnapshot,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub sent: usize,
    pub skipped_self: usize,
    pub throttled: usize,
}

impl TriggerResponse {
    fn from_outcomes(outcomes: &[NotifyOutcome]) -> Self {
        let count = |o: NotifyOutcome| outcomes.iter().filter(|x| **x == o).count();
        Self {
            sent: count(NotifyOutcome::Sent),
            skipped_self: count(NotifyOutcome::SkippedSelf),
            throttled: count(NotifyOutcome::Throttled),
        }
    }
}

/// POST /triggers/post-like
///
/// Notifies the post owner about newly-added likers.
pub async fn post_like_trigger(
    State(state): State<AppState>,
    Json(change): Json<SnapshotChange>,
) -> ApiResult<Json<TriggerResponse>> {
    let outcomes = state
        .notifications
        .on_likes(&change.before, &change.after, Utc::now())
        .await?;

    let response = TriggerResponse::from_outcomes(&outcomes);
    metrics::counter!("events_notifications_total", "kind" => "like")
        .increment(response.sent as u64);

    Ok(Json(response))
}

/// POST /triggers/post-comment
///
/// Notifies the post owner about new comments.
pub async fn post_comment_trigger(
    State(state): State<AppState>,
    Json(change): Json<SnapshotChange>,
) -> ApiResult<Json<TriggerResponse>> {
    let outcomes = state
        .notifications
        .on_comments(&change.before, &change.after, Utc::now())
        .await?;

    let response = TriggerResponse::from_outcomes(&outcomes);
    metrics::counter!("events_notifications_total", "kind" => "comment")
        .increment(response.sent as u64);

    Ok(Json(response))
}
