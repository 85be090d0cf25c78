//! Image model
//!
//! An image is owned by the uploading user and moves PENDING -> APPROVED or
//! REJECTED via automatic classification or manual admin review. The backing
//! object's bucket (public vs private) is derived from status: a status change
//! across the APPROVED boundary must relocate the object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::moderation::SafeSearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    Pending,
    Approved,
    Rejected,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Pending => "PENDING",
            ImageStatus::Approved => "APPROVED",
            ImageStatus::Rejected => "REJECTED",
        }
    }

    /// Approved images live in the public bucket; everything else stays
    /// private.
    pub fn is_public(&self) -> bool {
        matches!(self, ImageStatus::Approved)
    }
}

impl std::str::FromStr for ImageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ImageStatus::Pending),
            "APPROVED" => Ok(ImageStatus::Approved),
            "REJECTED" => Ok(ImageStatus::Rejected),
            other => Err(format!("unknown image status: {}", other)),
        }
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Object key within whichever bucket currently holds the file.
    pub storage_key: String,
    /// Public delivery URL; only populated while the image is approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    pub status: ImageStatus,
    /// Raw classifier output kept for audit; absent when the classifier was
    /// unreachable at upload time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_search: Option<SafeSearchResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
