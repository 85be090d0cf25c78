//! User repository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use staywork_core::models::User;
use staywork_core::{AppError, AppResult};
use uuid::Uuid;

use crate::traits::UserStore;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<Postgres, UserRow>(
            r#"
            SELECT id, email, name, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        })
    }
}
