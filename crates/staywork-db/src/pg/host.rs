//! Host repository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use staywork_core::models::Host;
use staywork_core::{AppError, AppResult};
use uuid::Uuid;

use crate::traits::HostStore;

#[derive(sqlx::FromRow)]
struct HostRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone)]
pub struct PgHostStore {
    pool: PgPool,
}

impl PgHostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HostStore for PgHostStore {
    #[tracing::instrument(skip(self), fields(db.table = "hosts", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> AppResult<Host> {
        let row = sqlx::query_as::<Postgres, HostRow>(
            r#"
            SELECT id, user_id, name, description, created_at, updated_at
            FROM hosts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("host not found".to_string()))?;

        Ok(Host {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
