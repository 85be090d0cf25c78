//! Application repository
//!
//! Applicant details and reviewer details are JSONB documents; status is a
//! TEXT column updated field-level, never by document replacement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row};
use staywork_core::models::{
    Application, ApplicationDetails, ApplicationStatus, ReviewDetails,
};
use staywork_core::{AppError, AppResult};
use uuid::Uuid;

use crate::traits::{ApplicationFilter, ApplicationStore, Page};

const SELECT_COLUMNS: &str = r#"
    id, user_id, opportunity_id, host_id, status, status_note,
    details, review, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct ApplicationRow {
    id: Uuid,
    user_id: Uuid,
    opportunity_id: Uuid,
    host_id: Uuid,
    status: String,
    status_note: Option<String>,
    details: serde_json::Value,
    review: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApplicationRow {
    fn into_domain(self) -> AppResult<Application> {
        let status: ApplicationStatus = self.status.parse().map_err(AppError::Internal)?;
        let details: ApplicationDetails = serde_json::from_value(self.details)?;
        let review: ReviewDetails = serde_json::from_value(self.review)?;

        Ok(Application {
            id: self.id,
            user_id: self.user_id,
            opportunity_id: self.opportunity_id,
            host_id: self.host_id,
            status,
            status_note: self.status_note,
            details,
            review,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn build_filter_clause(filter: &ApplicationFilter) -> String {
    let mut sql = String::from("WHERE TRUE");
    let mut param = 0usize;

    if filter.user_id.is_some() {
        param += 1;
        sql.push_str(&format!(" AND user_id = ${}", param));
    }
    if filter.opportunity_id.is_some() {
        param += 1;
        sql.push_str(&format!(" AND opportunity_id = ${}", param));
    }
    if filter.host_id.is_some() {
        param += 1;
        sql.push_str(&format!(" AND host_id = ${}", param));
    }
    if filter.status.is_some() {
        param += 1;
        sql.push_str(&format!(" AND status = ${}", param));
    }
    sql
}

#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    #[tracing::instrument(skip(self, application), fields(db.table = "applications", db.operation = "insert", application_id = %application.id))]
    async fn insert(&self, application: &Application) -> AppResult<()> {
        let details = serde_json::to_value(&application.details)?;
        let review = serde_json::to_value(&application.review)?;

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, user_id, opportunity_id, host_id, status, status_note,
                details, review, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(application.id)
        .bind(application.user_id)
        .bind(application.opportunity_id)
        .bind(application.host_id)
        .bind(application.status.as_str())
        .bind(&application.status_note)
        .bind(details)
        .bind(review)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> AppResult<Application> {
        let row = sqlx::query_as::<Postgres, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("application not found".to_string()))?;

        row.into_domain()
    }

    #[tracing::instrument(skip(self, filter), fields(db.table = "applications", db.operation = "select"))]
    async fn list(
        &self,
        filter: &ApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Page<Application>> {
        let clause = build_filter_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM applications {}", clause);
        let mut count_q = sqlx::query(&count_sql);
        if let Some(user_id) = filter.user_id {
            count_q = count_q.bind(user_id);
        }
        if let Some(opportunity_id) = filter.opportunity_id {
            count_q = count_q.bind(opportunity_id);
        }
        if let Some(host_id) = filter.host_id {
            count_q = count_q.bind(host_id);
        }
        if let Some(status) = filter.status {
            count_q = count_q.bind(status.as_str());
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?.get(0);

        let select_sql = format!(
            "SELECT {} FROM applications {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            SELECT_COLUMNS,
            clause,
            limit.max(1),
            offset.max(0)
        );
        let mut q = sqlx::query_as::<Postgres, ApplicationRow>(&select_sql);
        if let Some(user_id) = filter.user_id {
            q = q.bind(user_id);
        }
        if let Some(opportunity_id) = filter.opportunity_id {
            q = q.bind(opportunity_id);
        }
        if let Some(host_id) = filter.host_id {
            q = q.bind(host_id);
        }
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }

        let rows = q.fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(ApplicationRow::into_domain)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    #[tracing::instrument(skip(self, review), fields(db.table = "applications", db.operation = "update", new_status = %status))]
    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        note: Option<&str>,
        review: &ReviewDetails,
    ) -> AppResult<()> {
        let review = serde_json::to_value(review)?;

        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = $2, status_note = $3, review = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(note)
        .bind(review)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("application not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "delete"))]
    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("application not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let clause = build_filter_clause(&ApplicationFilter::default());
        assert_eq!(clause, "WHERE TRUE");
    }

    #[test]
    fn filters_number_params_in_order() {
        let filter = ApplicationFilter {
            user_id: Some(Uuid::new_v4()),
            opportunity_id: None,
            host_id: Some(Uuid::new_v4()),
            status: Some(ApplicationStatus::Pending),
        };
        let clause = build_filter_clause(&filter);
        assert!(clause.contains("user_id = $1"));
        assert!(clause.contains("host_id = $2"));
        assert!(clause.contains("status = $3"));
        assert!(!clause.contains("opportunity_id"));
    }
}
