//! Notification repository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use staywork_core::models::{Notification, NotificationKind};
use staywork_core::{AppError, AppResult};
use uuid::Uuid;

use crate::traits::NotificationStore;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    is_read: bool,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_domain(self) -> AppResult<Notification> {
        let kind: NotificationKind = self.kind.parse().map_err(AppError::Internal)?;
        let data: HashMap<String, String> = serde_json::from_value(self.data)?;

        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            kind,
            title: self.title,
            message: self.message,
            is_read: self.is_read,
            data,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    #[tracing::instrument(skip(self, notification), fields(db.table = "notifications", db.operation = "insert", user_id = %notification.user_id))]
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        let data = serde_json::to_value(&notification.data)?;

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, kind, title, message, is_read, data, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.is_read)
        .bind(data)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "notifications", db.operation = "select"))]
    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<Postgres, NotificationRow>(
            r#"
            SELECT id, user_id, kind, title, message, is_read, data, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(NotificationRow::into_domain)
            .collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = "notifications", db.operation = "update"))]
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("notification not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "notifications", db.operation = "update"))]
    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
