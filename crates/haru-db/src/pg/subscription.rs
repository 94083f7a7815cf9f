//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, billing_key, status, next_billing_date,
                   last_paid_at, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, billing_key, status, next_billing_date,
                   last_paid_at, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_due(&self, today: NaiveDate) -> DbResult<Vec<SubscriptionRow>> {
        // Canceled subscriptions expire on the day before their billing date,
        // so they enter the pass one day earlier than active ones.
        let tomorrow = today.succ_opt().unwrap_or(today);

        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, billing_key, status, next_billing_date,
                   last_paid_at, created_at, updated_at
            FROM subscriptions
            WHERE (status = 'active' AND next_billing_date <= $1)
               OR (status = 'canceled' AND next_billing_date <= $2)
            ORDER BY next_billing_date ASC
            "#,
        )
        .bind(today)
        .bind(tomorrow)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, user_id, billing_key, status, next_billing_date)
            VALUES ($1, $2, $3, 'active', $4)
            RETURNING id, user_id, billing_key, status, next_billing_date,
                      last_paid_at, created_at, updated_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(&sub.billing_key)
        .bind(sub.next_billing_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_billing_key(&self, id: Uuid, billing_key: &str) -> DbResult<()> {
        sqlx::query("UPDATE subscriptions SET billing_key = $1, updated_at = NOW() WHERE id = $2")
            .bind(billing_key)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_renewed(
        &self,
        id: Uuid,
        next_billing_date: NaiveDate,
        paid_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'active', next_billing_date = $1, last_paid_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(next_billing_date)
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_payment_failed(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'payment_failed', next_billing_date = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_expired(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'expired', next_billing_date = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_canceled(&self, id: Uuid) -> DbResult<()> {
        // next_billing_date is retained so the renewal pass can expire the
        // subscription at period end
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
