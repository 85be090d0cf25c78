use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    ApplicationCreated,
    ApplicationStatusChanged,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ApplicationCreated => "APPLICATION_CREATED",
            NotificationKind::ApplicationStatusChanged => "APPLICATION_STATUS_CHANGED",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPLICATION_CREATED" => Ok(NotificationKind::ApplicationCreated),
            "APPLICATION_STATUS_CHANGED" => Ok(NotificationKind::ApplicationStatusChanged),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// In-app notification addressed to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    /// Extra reference data, e.g. {"applicationId": "..."}.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}
