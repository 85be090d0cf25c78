//! Postgres persistence layer
//!
//! Store traits consumed by the service layer plus their sqlx/Postgres
//! implementations. Nested documents (time slots, application details,
//! notification data) are stored as JSONB; enum columns are stored as TEXT and
//! parsed at the boundary.

pub mod pg;
pub mod pool;
pub mod traits;

pub use pg::{
    PgApplicationStore, PgHostStore, PgImageStore, PgNotificationStore, PgOpportunityStore,
    PgUserStore,
};
pub use pool::setup_database;
pub use traits::{
    ApplicationFilter, ApplicationStore, GeoFilter, HostStore, ImageStore, NotificationStore,
    OpportunitySearch, OpportunityStore, Page, StatField, StayFilter, UserStore,
};
