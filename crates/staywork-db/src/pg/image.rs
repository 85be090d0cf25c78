//! Image repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use staywork_core::models::{Image, ImageStatus};
use staywork_core::{AppError, AppResult, SafeSearchResult};
use uuid::Uuid;

use crate::traits::ImageStore;

const SELECT_COLUMNS: &str = r#"
    id, user_id, storage_key, public_url, status, safe_search, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    user_id: Uuid,
    storage_key: String,
    public_url: Option<String>,
    status: String,
    safe_search: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ImageRow {
    fn into_domain(self) -> AppResult<Image> {
        let status: ImageStatus = self.status.parse().map_err(AppError::Internal)?;
        let safe_search: Option<SafeSearchResult> = self
            .safe_search
            .map(serde_json::from_value)
            .transpose()?;

        Ok(Image {
            id: self.id,
            user_id: self.user_id,
            storage_key: self.storage_key,
            public_url: self.public_url,
            status,
            safe_search,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    #[tracing::instrument(skip(self, image), fields(db.table = "images", db.operation = "insert", image_id = %image.id))]
    async fn insert(&self, image: &Image) -> AppResult<()> {
        let safe_search = image
            .safe_search
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO images (
                id, user_id, storage_key, public_url, status, safe_search,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(image.id)
        .bind(image.user_id)
        .bind(&image.storage_key)
        .bind(&image.public_url)
        .bind(image.status.as_str())
        .bind(safe_search)
        .bind(image.created_at)
        .bind(image.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> AppResult<Image> {
        let row = sqlx::query_as::<Postgres, ImageRow>(&format!(
            "SELECT {} FROM images WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("image not found".to_string()))?;

        row.into_domain()
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "update", new_status = %status))]
    async fn update_status(
        &self,
        id: Uuid,
        status: ImageStatus,
        public_url: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET status = $2, public_url = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(public_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("image not found".to_string()));
        }
        Ok(())
    }
}
