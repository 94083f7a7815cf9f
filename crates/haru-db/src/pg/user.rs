//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::{CreateUser, UserRepository};

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, nickname, subscriber, pay_method_kind,
                   pay_method_issuer, pay_method_masked, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, nickname)
            VALUES ($1, $2, $3)
            RETURNING id, email, nickname, subscriber, pay_method_kind,
                      pay_method_issuer, pay_method_masked, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.nickname)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_subscriber(&self, id: Uuid, subscriber: bool) -> DbResult<()> {
        sqlx::query("UPDATE users SET subscriber = $1, updated_at = NOW() WHERE id = $2")
            .bind(subscriber)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_pay_method(
        &self,
        id: Uuid,
        kind: &str,
        issuer: &str,
        masked: &str,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET pay_method_kind = $1, pay_method_issuer = $2, pay_method_masked = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(kind)
        .bind(issuer)
        .bind(masked)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
