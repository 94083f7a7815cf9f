//! PostgreSQL transfer webhook audit repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::TransferResultRow;
use crate::repo::{CreateTransferResult, TransferResultRepository};

/// PostgreSQL transfer result repository
#[derive(Clone)]
pub struct PgTransferResultRepository {
    pool: PgPool,
}

impl PgTransferResultRepository {
    /// Create a new transfer result repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferResultRepository for PgTransferResultRepository {
    async fn append(&self, result: CreateTransferResult) -> DbResult<TransferResultRow> {
        let row = sqlx::query_as::<_, TransferResultRow>(
            r#"
            INSERT INTO transfer_results (id, provider_code, payload)
            VALUES ($1, $2, $3)
            RETURNING id, provider_code, payload, received_at
            "#,
        )
        .bind(result.id)
        .bind(&result.provider_code)
        .bind(&result.payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
