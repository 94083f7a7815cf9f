//! Social notification triggers
//!
//! Compares before/after post snapshots, computes the newly-added actors,
//! and appends notifications to the post owner's feed. Self-actions are
//! never notified, and bursts are throttled.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use haru_db::{CreateNotification, NotificationRepository, UserRepository};
use haru_types::NotificationKind;

use crate::error::EventsError;

/// Burst threshold: more than this many notifications in the trailing window
const BURST_LIMIT: i64 = 10;
/// Trailing window the burst threshold is measured over
const BURST_WINDOW_MINUTES: i64 = 5;
/// A throttled owner gets nothing if anything was sent inside this window
const COOLDOWN_MINUTES: i64 = 15;

/// Maximum comment snippet length carried in a notification message
const SNIPPET_LEN: usize = 40;

/// Post document snapshot, as delivered by the store's change trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSnapshot {
    /// Post document id
    pub post_id: String,
    /// Post owner
    pub owner_id: Uuid,
    /// Users who liked the post
    #[serde(default)]
    pub likes: Vec<Uuid>,
    /// Comments on the post
    #[serde(default)]
    pub comments: Vec<CommentSnapshot>,
}

/// Comment snapshot inside a post document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentSnapshot {
    /// Comment id within the post
    pub comment_id: String,
    /// Comment author
    pub author_id: Uuid,
    /// Comment text
    pub text: String,
}

/// Per-actor outcome of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyOutcome {
    /// Notification appended
    Sent,
    /// Actor is the post owner; no self-notification
    SkippedSelf,
    /// Owner is over the burst threshold
    Throttled,
}

/// Social notification engine
pub struct NotificationEngine<N, U>
where
    N: NotificationRepository,
    U: UserRepository,
{
    notifications: Arc<N>,
    users: Arc<U>,
}

impl<N, U> NotificationEngine<N, U>
where
    N: NotificationRepository,
    U: UserRepository,
{
    /// Create a new notification engine
    pub fn new(notifications: Arc<N>, users: Arc<U>) -> Self {
        Self {
            notifications,
            users,
        }
    }

    /// Handle a like-counter change on a post.
    #[instrument(skip(self, before, after), fields(post_id = %after.post_id))]
    pub async fn on_likes(
        &self,
        before: &PostSnapshot,
        after: &PostSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotifyOutcome>, EventsError> {
        let added: Vec<Uuid> = after
            .likes
            .iter()
            .filter(|id| !before.likes.contains(id))
            .copied()
            .collect();

        debug!(added = added.len(), "New likes detected");

        let mut outcomes = Vec::with_capacity(added.len());
        for actor_id in added {
            let outcome = self
                .notify(after, actor_id, NotificationKind::Like, None, now)
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Handle new comments on a post.
    #[instrument(skip(self, before, after), fields(post_id = %after.post_id))]
    pub async fn on_comments(
        &self,
        before: &PostSnapshot,
        after: &PostSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Vec<NotifyOutcome>, EventsError> {
        let known: Vec<&str> = before.comments.iter().map(|c| c.comment_id.as_str()).collect();
        let added: Vec<&CommentSnapshot> = after
            .comments
            .iter()
            .filter(|c| !known.contains(&c.comment_id.as_str()))
            .collect();

        debug!(added = added.len(), "New comments detected");

        let mut outcomes = Vec::with_capacity(added.len());
        for comment in added {
            let outcome = self
                .notify(
                    after,
                    comment.author_id,
                    NotificationKind::Comment,
                    Some(comment.text.as_str()),
                    now,
                )
                .await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Append one notification, applying the self-action and burst rules.
    async fn notify(
        &self,
        post: &PostSnapshot,
        actor_id: Uuid,
        kind: NotificationKind,
        snippet: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<NotifyOutcome, EventsError> {
        if actor_id == post.owner_id {
            return Ok(NotifyOutcome::SkippedSelf);
        }

        let burst = self
            .notifications
            .count_since(post.owner_id, now - Duration::minutes(BURST_WINDOW_MINUTES))
            .await?;
        if burst > BURST_LIMIT {
            let recent = self
                .notifications
                .count_since(post.owner_id, now - Duration::minutes(COOLDOWN_MINUTES))
                .await?;
            if recent > 0 {
                info!(owner_id = %post.owner_id, burst, "Notification throttled");
                return Ok(NotifyOutcome::Throttled);
            }
        }

        let actor_name = match self.users.find_by_id(actor_id).await? {
            Some(user) => user.nickname,
            None => "Someone".to_string(),
        };

        let message = match kind {
            NotificationKind::Like => format!("{actor_name} liked your post"),
            NotificationKind::Comment => {
                let text = snippet.unwrap_or_default();
                let short: String = text.chars().take(SNIPPET_LEN).collect();
                format!("{actor_name} commented on your post: {short}")
            }
        };

        self.notifications
            .append(CreateNotification {
                id: Uuid::new_v4(),
                owner_id: post.owner_id,
                actor_id,
                kind: kind.to_string(),
                post_id: post.post_id.clone(),
                message,
            })
            .await?;

        Ok(NotifyOutcome::Sent)
    }
}
