//! Opportunity and time-slot models
//!
//! An opportunity owns zero or more stay-availability time slots. When
//! `has_time_slots` is set, application admission must find an open slot that
//! fully contains the requested stay; when unset, date validation is bypassed
//! entirely (a deliberate policy switch).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    Draft,
    Pending,
    Active,
    Paused,
    Expired,
    Filled,
    Rejected,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::Draft => "DRAFT",
            OpportunityStatus::Pending => "PENDING",
            OpportunityStatus::Active => "ACTIVE",
            OpportunityStatus::Paused => "PAUSED",
            OpportunityStatus::Expired => "EXPIRED",
            OpportunityStatus::Filled => "FILLED",
            OpportunityStatus::Rejected => "REJECTED",
        }
    }
}

impl std::str::FromStr for OpportunityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(OpportunityStatus::Draft),
            "PENDING" => Ok(OpportunityStatus::Pending),
            "ACTIVE" => Ok(OpportunityStatus::Active),
            "PAUSED" => Ok(OpportunityStatus::Paused),
            "EXPIRED" => Ok(OpportunityStatus::Expired),
            "FILLED" => Ok(OpportunityStatus::Filled),
            "REJECTED" => Ok(OpportunityStatus::Rejected),
            other => Err(format!("unknown opportunity status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityKind {
    Farming,
    Gardening,
    AnimalCare,
    Hospitality,
    Cooking,
    Teaching,
    LanguageExchange,
    Creative,
    Conservation,
    Community,
    Other,
}

impl OpportunityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::Farming => "FARMING",
            OpportunityKind::Gardening => "GARDENING",
            OpportunityKind::AnimalCare => "ANIMAL_CARE",
            OpportunityKind::Hospitality => "HOSPITALITY",
            OpportunityKind::Cooking => "COOKING",
            OpportunityKind::Teaching => "TEACHING",
            OpportunityKind::LanguageExchange => "LANGUAGE_EXCHANGE",
            OpportunityKind::Creative => "CREATIVE",
            OpportunityKind::Conservation => "CONSERVATION",
            OpportunityKind::Community => "COMMUNITY",
            OpportunityKind::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for OpportunityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FARMING" => Ok(OpportunityKind::Farming),
            "GARDENING" => Ok(OpportunityKind::Gardening),
            "ANIMAL_CARE" => Ok(OpportunityKind::AnimalCare),
            "HOSPITALITY" => Ok(OpportunityKind::Hospitality),
            "COOKING" => Ok(OpportunityKind::Cooking),
            "TEACHING" => Ok(OpportunityKind::Teaching),
            "LANGUAGE_EXCHANGE" => Ok(OpportunityKind::LanguageExchange),
            "CREATIVE" => Ok(OpportunityKind::Creative),
            "CONSERVATION" => Ok(OpportunityKind::Conservation),
            "COMMUNITY" => Ok(OpportunityKind::Community),
            "OTHER" => Ok(OpportunityKind::Other),
            other => Err(format!("unknown opportunity kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSlotStatus {
    Open,
    Filled,
    Closed,
}

/// Capacity override for a sub-period of a slot (seasonal adjustments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityOverride {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity: u32,
}

/// A bounded stay-availability window on an opportunity. Dates are calendar
/// dates and inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub default_capacity: u32,
    #[serde(default)]
    pub minimum_stay_days: u32,
    #[serde(default)]
    pub applied_count: u32,
    #[serde(default)]
    pub confirmed_count: u32,
    pub status: TimeSlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capacity_overrides: Vec<CapacityOverride>,
}

impl TimeSlot {
    /// Effective capacity on a given date: the first matching override wins,
    /// otherwise the default.
    pub fn effective_capacity(&self, date: NaiveDate) -> u32 {
        self.capacity_overrides
            .iter()
            .find(|o| o.start_date <= date && o.end_date >= date)
            .map(|o| o.capacity)
            .unwrap_or(self.default_capacity)
    }

    /// Whether this slot fully contains the requested range. Partial overlap
    /// does not count.
    pub fn contains(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= start && self.end_date >= end
    }
}

/// Availability matcher: true iff at least one OPEN slot fully contains the
/// requested `[start, end]` range. Existence is sufficient; there is no
/// ordering preference among matching slots.
pub fn is_date_range_available(slots: &[TimeSlot], start: NaiveDate, end: NaiveDate) -> bool {
    slots
        .iter()
        .any(|slot| slot.status == TimeSlotStatus::Open && slot.contains(start, end))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub city: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// Denormalized engagement counters, updated by side effects. Not guaranteed
/// transactionally consistent with the underlying collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityStats {
    pub views: i64,
    pub applications: i64,
    pub bookmarks: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub slug: String,
    pub public_id: String,
    pub description: String,
    pub short_description: String,
    pub status: OpportunityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_note: Option<String>,
    pub kind: OpportunityKind,
    pub location: OpportunityLocation,
    #[serde(default)]
    pub stats: OpportunityStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_slots: Vec<TimeSlot>,
    pub has_time_slots: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
