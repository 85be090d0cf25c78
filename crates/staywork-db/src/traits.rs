//! Store traits
//!
//! The service layer depends on these traits rather than concrete Postgres
//! repositories so it can be exercised against in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use staywork_core::models::{
    Application, ApplicationStatus, Host, Image, ImageStatus, Notification, Opportunity,
    OpportunityKind, OpportunityStatus, ReviewDetails, User,
};
use staywork_core::AppResult;
use uuid::Uuid;

/// One page of results plus the total count over the same filter.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Geographic radius filter. Radius is in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: f64,
}

/// Requested stay range; matches only opportunities with an open slot that
/// fully contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayFilter {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Opportunity search parameters. All filters are ANDed; only ACTIVE
/// opportunities are ever returned.
#[derive(Debug, Clone, Default)]
pub struct OpportunitySearch {
    pub text: Option<String>,
    pub kind: Option<OpportunityKind>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub near: Option<GeoFilter>,
    pub stay: Option<StayFilter>,
    pub limit: i64,
    pub offset: i64,
}

/// Denormalized counter selector for stats bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Views,
    Applications,
    Bookmarks,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub user_id: Option<Uuid>,
    pub opportunity_id: Option<Uuid>,
    pub host_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn insert(&self, opportunity: &Opportunity) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Opportunity>;

    /// Field-level status update; never touches the rest of the document.
    async fn update_status(
        &self,
        id: Uuid,
        status: OpportunityStatus,
        note: Option<&str>,
    ) -> AppResult<()>;

    async fn search(&self, query: &OpportunitySearch) -> AppResult<Page<Opportunity>>;

    /// Bump a denormalized engagement counter by `delta`.
    async fn bump_stat(&self, id: Uuid, field: StatField, delta: i64) -> AppResult<()>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert(&self, application: &Application) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Application>;

    async fn list(
        &self,
        filter: &ApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Page<Application>>;

    /// Field-level update of status, note and reviewer details.
    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        note: Option<&str>,
        review: &ReviewDetails,
    ) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, image: &Image) -> AppResult<()>;

    async fn get(&self, id: Uuid) -> AppResult<Image>;

    /// Field-level update of status and public URL. The storage key never
    /// changes after upload.
    async fn update_status(
        &self,
        id: Uuid,
        status: ImageStatus,
        public_url: Option<&str>,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait HostStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Host>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<User>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Notification>>;

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()>;

    async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64>;
}
