//! Outbound notification dispatch seam
//!
//! The admission path hands messages to an implementation of this trait and
//! moves on; delivery happens on the queue's own lifetime. `enqueue` must
//! never block and never fail the caller.

use std::collections::HashMap;

use staywork_core::models::NotificationKind;
use uuid::Uuid;

/// A notification addressed to a host profile. The consumer resolves the
/// host's owning user before delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct HostNotification {
    pub host_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: HashMap<String, String>,
}

pub trait NotificationDispatch: Send + Sync {
    /// Hand a message over for asynchronous delivery. Fire-and-forget: a full
    /// or stopped queue drops the message (implementations log the drop).
    fn enqueue(&self, notification: HostNotification);
}
