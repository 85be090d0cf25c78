//! Outbound notification queue
//!
//! Decouples notification delivery from the request paths that produce them.
//! The queue owns its worker pool; producers hand messages over with a
//! non-blocking enqueue and never learn about delivery failures.

pub mod queue;

pub use queue::NotificationQueue;
