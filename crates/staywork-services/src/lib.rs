//! Orchestration services
//!
//! Application admission, image moderation, opportunity management and
//! notification delivery. Services depend on the store traits from
//! `staywork-db` and the `ObjectStorage` trait from `staywork-storage`, which
//! keeps them testable against in-memory fakes.

pub mod application;
pub mod classifier;
pub mod dispatch;
pub mod email;
pub mod image;
pub mod notification;
pub mod opportunity;

#[cfg(test)]
pub(crate) mod test_support;

pub use application::ApplicationService;
pub use classifier::{RekognitionClassifier, SafeSearchClassifier};
pub use dispatch::{HostNotification, NotificationDispatch};
pub use email::{EmailSender, SmtpEmailSender};
pub use image::ImageService;
pub use notification::NotificationService;
pub use opportunity::{OpportunityService, SearchRequest};
