//! Opportunity management and search composition

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use staywork_core::models::{
    Opportunity, OpportunityKind, OpportunityLocation, OpportunityStats, OpportunityStatus,
    TimeSlot,
};
use staywork_core::{AppError, AppResult};
use staywork_db::{
    GeoFilter, HostStore, OpportunitySearch, OpportunityStore, Page, StatField, StayFilter,
};
use uuid::Uuid;

/// Lowercase, alphanumeric, hyphen-separated slug derived from a title.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Caller-facing search parameters. Geo and date filters only engage when
/// their parts are complete; a missing radius falls back to the configured
/// default.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub text: Option<String>,
    pub kind: Option<OpportunityKind>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_meters: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Clone)]
pub struct OpportunityService {
    opportunities: Arc<dyn OpportunityStore>,
    hosts: Arc<dyn HostStore>,
    default_radius_meters: f64,
}

/// Input for opportunity creation; slug, public id, status and counters are
/// stamped by the service.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub kind: OpportunityKind,
    pub location: OpportunityLocation,
    pub time_slots: Vec<TimeSlot>,
    pub has_time_slots: bool,
}

impl OpportunityService {
    pub fn new(
        opportunities: Arc<dyn OpportunityStore>,
        hosts: Arc<dyn HostStore>,
        default_radius_meters: f64,
    ) -> Self {
        Self {
            opportunities,
            hosts,
            default_radius_meters,
        }
    }

    /// Create an opportunity in DRAFT status. Slug collisions surface as
    /// Conflict from the unique constraint.
    #[tracing::instrument(skip(self, new), fields(host_id = %new.host_id))]
    pub async fn create(&self, new: NewOpportunity) -> AppResult<Opportunity> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        // The host must exist before an opportunity can reference it.
        self.hosts.get(new.host_id).await?;

        let slug = slugify(&new.title);
        if slug.is_empty() {
            return Err(AppError::Validation(
                "title must contain alphanumeric characters".to_string(),
            ));
        }

        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4(),
            host_id: new.host_id,
            title: new.title,
            slug,
            public_id: Uuid::new_v4().simple().to_string(),
            description: new.description,
            short_description: new.short_description,
            status: OpportunityStatus::Draft,
            status_note: None,
            kind: new.kind,
            location: new.location,
            stats: OpportunityStats::default(),
            time_slots: new.time_slots,
            has_time_slots: new.has_time_slots,
            created_at: now,
            updated_at: now,
        };

        self.opportunities.insert(&opportunity).await?;
        tracing::info!(opportunity_id = %opportunity.id, slug = %opportunity.slug, "Opportunity created");
        Ok(opportunity)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Opportunity> {
        self.opportunities.get(id).await
    }

    /// Record a listing view. Best-effort: a failed bump is logged, never
    /// surfaced.
    pub async fn record_view(&self, id: Uuid) {
        if let Err(e) = self.opportunities.bump_stat(id, StatField::Views, 1).await {
            tracing::warn!(error = %e, opportunity_id = %id, "Failed to bump view counter");
        }
    }

    pub async fn bookmark(&self, id: Uuid, delta: i64) -> AppResult<()> {
        self.opportunities
            .bump_stat(id, StatField::Bookmarks, delta)
            .await
    }

    /// Compose and run a search. Only ACTIVE opportunities are returned.
    #[tracing::instrument(skip(self, request))]
    pub async fn search(&self, request: SearchRequest) -> AppResult<Page<Opportunity>> {
        let near = match (request.lat, request.lng) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(AppError::Validation(
                        "coordinates out of range".to_string(),
                    ));
                }
                Some(GeoFilter {
                    lat,
                    lng,
                    radius_meters: request
                        .radius_meters
                        .filter(|r| *r > 0.0)
                        .unwrap_or(self.default_radius_meters),
                })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "both lat and lng are required for geo search".to_string(),
                ))
            }
        };

        let stay = match (request.start_date, request.end_date) {
            (Some(start), Some(end)) => {
                if start > end {
                    return Err(AppError::Validation(
                        "start date must not be after end date".to_string(),
                    ));
                }
                Some(StayFilter { start, end })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "both start and end dates are required for availability search".to_string(),
                ))
            }
        };

        let query = OpportunitySearch {
            text: request.text.filter(|t| !t.trim().is_empty()),
            kind: request.kind,
            city: request.city.filter(|c| !c.trim().is_empty()),
            country: request.country.filter(|c| !c.trim().is_empty()),
            near,
            stay,
            limit: if request.limit > 0 { request.limit.min(100) } else { 20 },
            offset: request.offset.max(0),
        };

        self.opportunities.search(&query).await
    }

    /// Soft delete: the listing drops out of search by status, the row stays.
    #[tracing::instrument(skip(self), fields(opportunity_id = %id))]
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> AppResult<()> {
        let opportunity = self.opportunities.get(id).await?;
        let host = self.hosts.get(opportunity.host_id).await?;
        if host.user_id != acting_user {
            return Err(AppError::Forbidden(
                "only the owning host may delete an opportunity".to_string(),
            ));
        }

        self.opportunities
            .update_status(id, OpportunityStatus::Expired, Some("deleted by host"))
            .await
    }
}
