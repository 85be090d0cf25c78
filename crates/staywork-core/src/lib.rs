//! Staywork Core Library
//!
//! This crate provides the domain models, pure decision logic, error types and
//! configuration shared across all staywork components.

pub mod config;
pub mod error;
pub mod models;
pub mod moderation;

// Re-export commonly used types
pub use config::{Config, ModerationConfig, NotificationQueueConfig, SmtpConfig, StorageBackend, StorageConfig};
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use moderation::{decide_image_status, Likelihood, RejectThresholds, SafeSearchResult};
