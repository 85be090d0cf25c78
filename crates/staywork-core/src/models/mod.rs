//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific feature area.

mod application;
mod host;
mod image;
mod notification;
mod opportunity;
mod user;

// Re-export all models for convenient imports
pub use application::*;
pub use host::*;
pub use image::*;
pub use notification::*;
pub use opportunity::*;
pub use user::*;
