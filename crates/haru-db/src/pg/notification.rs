//! PostgreSQL notification repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::NotificationRow;
use crate::repo::{CreateNotification, NotificationRepository};

/// PostgreSQL notification repository
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn append(&self, notification: CreateNotification) -> DbResult<NotificationRow> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (id, owner_id, actor_id, kind, post_id, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, actor_id, kind, post_id, message, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.owner_id)
        .bind(notification.actor_id)
        .bind(&notification.kind)
        .bind(&notification.post_id)
        .bind(&notification.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn count_since(&self, owner_id: Uuid, since: DateTime<Utc>) -> DbResult<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE owner_id = $1 AND created_at >= $2",
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
