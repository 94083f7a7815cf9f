//! PostgreSQL order repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::OrderRow;
use crate::repo::{CreateOrder, OrderRepository};

/// PostgreSQL order repository
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<OrderRow>> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product_id, quantity, amount, payment_oid, paid_at,
                   carrier_id, tracking_number, delivery_status, delivery_events, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn create(&self, order: CreateOrder) -> DbResult<OrderRow> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (id, user_id, product_id, quantity, amount, payment_oid, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, product_id, quantity, amount, payment_oid, paid_at,
                      carrier_id, tracking_number, delivery_status, delivery_events, created_at
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.product_id)
        .bind(order.quantity)
        .bind(order.amount)
        .bind(&order.payment_oid)
        .bind(order.paid_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_tracking(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> DbResult<Vec<OrderRow>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product_id, quantity, amount, payment_oid, paid_at,
                   carrier_id, tracking_number, delivery_status, delivery_events, created_at
            FROM orders
            WHERE carrier_id = $1 AND tracking_number = $2
            "#,
        )
        .bind(carrier_id)
        .bind(tracking_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn update_delivery(
        &self,
        id: Uuid,
        status: &str,
        events: serde_json::Value,
    ) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET delivery_status = $1, delivery_events = $2
            WHERE id = $3
            "#,
        )
        .bind(status)
        .bind(events)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn archive_and_delete(&self, order: &OrderRow) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO canceled_orders (id, user_id, product_id, quantity, amount,
                                         payment_oid, paid_at, ordered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.product_id)
        .bind(order.quantity)
        .bind(order.amount)
        .bind(&order.payment_oid)
        .bind(order.paid_at)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
