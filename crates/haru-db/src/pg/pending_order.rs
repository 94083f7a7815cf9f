//! PostgreSQL pending order repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PendingOrderRow;
use crate::repo::{CreatePendingOrder, PendingOrderRepository};

/// PostgreSQL pending order repository
#[derive(Clone)]
pub struct PgPendingOrderRepository {
    pool: PgPool,
}

impl PgPendingOrderRepository {
    /// Create a new pending order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PendingOrderRepository for PgPendingOrderRepository {
    async fn find_by_user_and_oid(
        &self,
        user_id: Uuid,
        payment_oid: &str,
    ) -> DbResult<Option<PendingOrderRow>> {
        let order = sqlx::query_as::<_, PendingOrderRow>(
            r#"
            SELECT id, user_id, payment_oid, goods_name, amount, status,
                   created_at, updated_at
            FROM pending_orders
            WHERE user_id = $1 AND payment_oid = $2
            "#,
        )
        .bind(user_id)
        .bind(payment_oid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn create(&self, order: CreatePendingOrder) -> DbResult<PendingOrderRow> {
        let row = sqlx::query_as::<_, PendingOrderRow>(
            r#"
            INSERT INTO pending_orders (id, user_id, payment_oid, goods_name, amount, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING id, user_id, payment_oid, goods_name, amount, status,
                      created_at, updated_at
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.payment_oid)
        .bind(&order.goods_name)
        .bind(order.amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        sqlx::query("UPDATE pending_orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
