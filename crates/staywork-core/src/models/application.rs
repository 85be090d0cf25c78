//! Application model and status lifecycle
//!
//! An application references one user, one opportunity and one host. The host
//! id is denormalized from the opportunity at creation time and never
//! re-derived afterwards. Status legality is enforced by an explicit
//! transition table rather than a blind overwrite.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether a transition from `self` to `next` is legal.
    ///
    /// Rejected and Cancelled are terminal; in particular Rejected can never
    /// move back to Accepted. A same-status transition is allowed so that
    /// repeated updates are idempotent at the service layer.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (*self, next),
            (Draft, Pending)
                | (Draft, Cancelled)
                | (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
        )
    }

    /// Applications may only be deleted while still unreviewed.
    pub fn is_deletable(&self) -> bool {
        matches!(self, ApplicationStatus::Draft | ApplicationStatus::Pending)
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ApplicationStatus::Draft),
            "PENDING" => Ok(ApplicationStatus::Pending),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            "CANCELLED" => Ok(ApplicationStatus::Cancelled),
            other => Err(format!("unknown application status: {}", other)),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicant-supplied details, including the requested stay range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub message: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_experience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub opportunity_id: Uuid,
    pub host_id: Uuid,
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_note: Option<String>,
    pub details: ApplicationDetails,
    #[serde(default)]
    pub review: ReviewDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for the admission path. The service stamps host id, status and
/// timestamps itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub opportunity_id: Uuid,
    pub details: ApplicationDetails,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn pending_can_be_reviewed_or_cancelled() {
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn rejected_is_terminal() {
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Rejected.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Cancelled));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Accepted));
    }

    #[test]
    fn draft_can_only_submit_or_cancel() {
        assert!(Draft.can_transition_to(Pending));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Draft.can_transition_to(Rejected));
    }

    #[test]
    fn same_status_is_allowed() {
        assert!(Pending.can_transition_to(Pending));
        assert!(Rejected.can_transition_to(Rejected));
    }

    #[test]
    fn only_draft_and_pending_are_deletable() {
        assert!(Draft.is_deletable());
        assert!(Pending.is_deletable());
        assert!(!Accepted.is_deletable());
        assert!(!Rejected.is_deletable());
        assert!(!Cancelled.is_deletable());
    }
}
