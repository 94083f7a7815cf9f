//! PostgreSQL payment audit repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PaymentRow;
use crate::repo::{CreatePayment, PaymentRepository};

/// PostgreSQL payment repository (append-only audit trail)
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn append(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (id, user_id, subscription_id, order_ref, amount,
                                  provider_code, message, succeeded)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, subscription_id, order_ref, amount,
                      provider_code, message, succeeded, created_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.subscription_id)
        .bind(&payment.order_ref)
        .bind(payment.amount)
        .bind(&payment.provider_code)
        .bind(&payment.message)
        .bind(payment.succeeded)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<PaymentRow>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, subscription_id, order_ref, amount,
                   provider_code, message, succeeded, created_at
            FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
