//! sqlx/Postgres implementations of the store traits

mod application;
mod host;
mod image;
mod notification;
mod opportunity;
mod user;

pub use application::PgApplicationStore;
pub use host::PgHostStore;
pub use image::PgImageStore;
pub use notification::PgNotificationStore;
pub use opportunity::PgOpportunityStore;
pub use user::PgUserStore;
