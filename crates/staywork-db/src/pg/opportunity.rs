//! Opportunity repository
//!
//! Time slots live in a JSONB column so the availability document travels with
//! the opportunity; the search query filters on them with an EXISTS over
//! `jsonb_array_elements`. Full-text search uses a generated tsvector column
//! backed by a GIN index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row};
use staywork_core::models::{
    GeoPoint, Opportunity, OpportunityLocation, OpportunityStats, OpportunityStatus, TimeSlot,
};
use staywork_core::{AppError, AppResult};
use uuid::Uuid;

use crate::traits::{OpportunitySearch, OpportunityStore, Page, StatField};

const SELECT_COLUMNS: &str = r#"
    id, host_id, title, slug, public_id, description, short_description,
    status, status_note, kind, address, city, country, lat, lng,
    views, applications, bookmarks, time_slots, has_time_slots,
    created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct OpportunityRow {
    id: Uuid,
    host_id: Uuid,
    title: String,
    slug: String,
    public_id: String,
    description: String,
    short_description: String,
    status: String,
    status_note: Option<String>,
    kind: String,
    address: Option<String>,
    city: String,
    country: String,
    lat: Option<f64>,
    lng: Option<f64>,
    views: i64,
    applications: i64,
    bookmarks: i64,
    time_slots: serde_json::Value,
    has_time_slots: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OpportunityRow {
    fn into_domain(self) -> AppResult<Opportunity> {
        let status: OpportunityStatus = self
            .status
            .parse()
            .map_err(AppError::Internal)?;
        let kind = self.kind.parse().map_err(AppError::Internal)?;
        let time_slots: Vec<TimeSlot> = serde_json::from_value(self.time_slots)?;

        let coordinates = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Ok(Opportunity {
            id: self.id,
            host_id: self.host_id,
            title: self.title,
            slug: self.slug,
            public_id: self.public_id,
            description: self.description,
            short_description: self.short_description,
            status,
            status_note: self.status_note,
            kind,
            location: OpportunityLocation {
                address: self.address,
                city: self.city,
                country: self.country,
                coordinates,
            },
            stats: OpportunityStats {
                views: self.views,
                applications: self.applications,
                bookmarks: self.bookmarks,
            },
            time_slots,
            has_time_slots: self.has_time_slots,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Builds the dynamic WHERE clause shared by the search and count queries.
/// Returns the clause text; bind order must follow the clause order exactly.
struct SearchClauses {
    where_sql: String,
    order_sql: String,
}

fn build_search_clauses(query: &OpportunitySearch) -> SearchClauses {
    let mut where_sql = String::from("WHERE status = 'ACTIVE'");
    let mut param = 0usize;

    let text_param = query.text.as_ref().map(|_| {
        param += 1;
        where_sql.push_str(&format!(
            " AND search_tsv @@ plainto_tsquery('simple', ${})",
            param
        ));
        param
    });

    if query.kind.is_some() {
        param += 1;
        where_sql.push_str(&format!(" AND kind = ${}", param));
    }
    if query.city.is_some() {
        param += 1;
        where_sql.push_str(&format!(" AND lower(city) = lower(${})", param));
    }
    if query.country.is_some() {
        param += 1;
        where_sql.push_str(&format!(" AND lower(country) = lower(${})", param));
    }

    // Haversine distance in meters. The three parameters are bound once each
    // and referenced by number wherever the formula needs them.
    let geo_params = query.near.as_ref().map(|_| {
        let lat_p = param + 1;
        let lng_p = param + 2;
        let radius_p = param + 3;
        param += 3;
        where_sql.push_str(&format!(
            " AND lat IS NOT NULL AND lng IS NOT NULL \
             AND 2 * 6371000 * asin(sqrt( \
                 power(sin(radians(lat - ${lat}) / 2), 2) + \
                 cos(radians(${lat})) * cos(radians(lat)) * \
                 power(sin(radians(lng - ${lng}) / 2), 2) \
             )) <= ${radius}",
            lat = lat_p,
            lng = lng_p,
            radius = radius_p
        ));
        (lat_p, lng_p)
    });

    if query.stay.is_some() {
        let start_p = param + 1;
        let end_p = param + 2;
        // Full containment: the slot window must cover the whole requested
        // range, mirroring the in-process availability matcher.
        where_sql.push_str(&format!(
            " AND EXISTS ( \
                 SELECT 1 FROM jsonb_array_elements(time_slots) AS slot \
                 WHERE slot->>'status' = 'OPEN' \
                   AND (slot->>'startDate')::date <= ${start} \
                   AND (slot->>'endDate')::date >= ${end} \
             )",
            start = start_p,
            end = end_p
        ));
    }

    let order_sql = if let Some(text_p) = text_param {
        format!(
            "ORDER BY ts_rank(search_tsv, plainto_tsquery('simple', ${})) DESC, created_at DESC",
            text_p
        )
    } else if let Some((lat_p, lng_p)) = geo_params {
        format!(
            "ORDER BY 2 * 6371000 * asin(sqrt( \
                 power(sin(radians(lat - ${lat}) / 2), 2) + \
                 cos(radians(${lat})) * cos(radians(lat)) * \
                 power(sin(radians(lng - ${lng}) / 2), 2) \
             )) ASC",
            lat = lat_p,
            lng = lng_p
        )
    } else {
        "ORDER BY created_at DESC".to_string()
    };

    SearchClauses {
        where_sql,
        order_sql,
    }
}

/// Binds search filter values in the same order `build_search_clauses`
/// assigned their parameter numbers.
fn bind_search_filters<'q, O>(
    mut q: sqlx::query::QueryAs<'q, Postgres, O, sqlx::postgres::PgArguments>,
    query: &'q OpportunitySearch,
) -> sqlx::query::QueryAs<'q, Postgres, O, sqlx::postgres::PgArguments> {
    if let Some(ref text) = query.text {
        q = q.bind(text);
    }
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(ref city) = query.city {
        q = q.bind(city);
    }
    if let Some(ref country) = query.country {
        q = q.bind(country);
    }
    if let Some(ref near) = query.near {
        q = q.bind(near.lat).bind(near.lng).bind(near.radius_meters);
    }
    if let Some(ref stay) = query.stay {
        q = q.bind(stay.start).bind(stay.end);
    }
    q
}

fn bind_count_filters<'q>(
    mut q: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    query: &'q OpportunitySearch,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    if let Some(ref text) = query.text {
        q = q.bind(text);
    }
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(ref city) = query.city {
        q = q.bind(city);
    }
    if let Some(ref country) = query.country {
        q = q.bind(country);
    }
    if let Some(ref near) = query.near {
        q = q.bind(near.lat).bind(near.lng).bind(near.radius_meters);
    }
    if let Some(ref stay) = query.stay {
        q = q.bind(stay.start).bind(stay.end);
    }
    q
}

#[derive(Clone)]
pub struct PgOpportunityStore {
    pool: PgPool,
}

impl PgOpportunityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityStore for PgOpportunityStore {
    #[tracing::instrument(skip(self, opportunity), fields(db.table = "opportunities", db.operation = "insert", opportunity_id = %opportunity.id))]
    async fn insert(&self, opportunity: &Opportunity) -> AppResult<()> {
        let time_slots = serde_json::to_value(&opportunity.time_slots)?;
        let coords = opportunity.location.coordinates.as_ref();

        sqlx::query(
            r#"
            INSERT INTO opportunities (
                id, host_id, title, slug, public_id, description, short_description,
                status, status_note, kind, address, city, country, lat, lng,
                views, applications, bookmarks, time_slots, has_time_slots,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(opportunity.id)
        .bind(opportunity.host_id)
        .bind(&opportunity.title)
        .bind(&opportunity.slug)
        .bind(&opportunity.public_id)
        .bind(&opportunity.description)
        .bind(&opportunity.short_description)
        .bind(opportunity.status.as_str())
        .bind(&opportunity.status_note)
        .bind(opportunity.kind.as_str())
        .bind(&opportunity.location.address)
        .bind(&opportunity.location.city)
        .bind(&opportunity.location.country)
        .bind(coords.map(|c| c.lat))
        .bind(coords.map(|c| c.lng))
        .bind(opportunity.stats.views)
        .bind(opportunity.stats.applications)
        .bind(opportunity.stats.bookmarks)
        .bind(time_slots)
        .bind(opportunity.has_time_slots)
        .bind(opportunity.created_at)
        .bind(opportunity.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "opportunities", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> AppResult<Opportunity> {
        let row = sqlx::query_as::<Postgres, OpportunityRow>(&format!(
            "SELECT {} FROM opportunities WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("opportunity not found".to_string()))?;

        row.into_domain()
    }

    #[tracing::instrument(skip(self), fields(db.table = "opportunities", db.operation = "update"))]
    async fn update_status(
        &self,
        id: Uuid,
        status: OpportunityStatus,
        note: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE opportunities
            SET status = $2, status_note = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(note)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("opportunity not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, query), fields(db.table = "opportunities", db.operation = "search"))]
    async fn search(&self, query: &OpportunitySearch) -> AppResult<Page<Opportunity>> {
        let clauses = build_search_clauses(query);

        let count_sql = format!("SELECT COUNT(*) FROM opportunities {}", clauses.where_sql);
        let total: i64 = bind_count_filters(sqlx::query(&count_sql), query)
            .fetch_one(&self.pool)
            .await?
            .get(0);

        let limit = if query.limit > 0 { query.limit } else { 20 };
        let offset = query.offset.max(0);
        let select_sql = format!(
            "SELECT {} FROM opportunities {} {} LIMIT {} OFFSET {}",
            SELECT_COLUMNS, clauses.where_sql, clauses.order_sql, limit, offset
        );

        let rows = bind_search_filters(
            sqlx::query_as::<Postgres, OpportunityRow>(&select_sql),
            query,
        )
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(OpportunityRow::into_domain)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    #[tracing::instrument(skip(self), fields(db.table = "opportunities", db.operation = "update"))]
    async fn bump_stat(&self, id: Uuid, field: StatField, delta: i64) -> AppResult<()> {
        let column = match field {
            StatField::Views => "views",
            StatField::Applications => "applications",
            StatField::Bookmarks => "bookmarks",
        };
        // Column name comes from the match above, never from input.
        let sql = format!(
            "UPDATE opportunities SET {col} = GREATEST({col} + $2, 0) WHERE id = $1",
            col = column
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("opportunity not found".to_string()));
        }
        Ok(())
    }
}
