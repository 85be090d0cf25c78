//! Image moderation policy
//!
//! Pure decision logic mapping a safe-search classification (five independent
//! ordinal category likelihoods) to an image status, driven by per-category
//! reject thresholds from configuration. The decision never performs I/O; the
//! storage-bucket side effects live in the image service.

use serde::{Deserialize, Serialize};

use crate::models::ImageStatus;

/// Ordinal likelihood scale used uniformly across all moderation categories.
///
/// Derived `Ord` follows declaration order, so threshold comparison is a plain
/// `>=` on the enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Likelihood::Unknown => "UNKNOWN",
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        }
    }

    /// Parse a configured threshold label. Empty or unrecognized labels yield
    /// `None`, meaning "never reject on this category". Config typos therefore
    /// loosen moderation rather than crash startup; `Config::validate` warns.
    pub fn parse_threshold(label: &str) -> Option<Likelihood> {
        match label.trim() {
            "VERY_UNLIKELY" => Some(Likelihood::VeryUnlikely),
            "UNLIKELY" => Some(Likelihood::Unlikely),
            "POSSIBLE" => Some(Likelihood::Possible),
            "LIKELY" => Some(Likelihood::Likely),
            "VERY_LIKELY" => Some(Likelihood::VeryLikely),
            _ => None,
        }
    }
}

impl std::fmt::Display for Likelihood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier output: one likelihood per moderation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SafeSearchResult {
    pub adult: Likelihood,
    pub racy: Likelihood,
    pub violence: Likelihood,
    pub medical: Likelihood,
    pub spoof: Likelihood,
}

/// Per-category minimum-reject likelihoods. `None` disables rejection on that
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RejectThresholds {
    pub adult: Option<Likelihood>,
    pub racy: Option<Likelihood>,
    pub violence: Option<Likelihood>,
    pub medical: Option<Likelihood>,
    pub spoof: Option<Likelihood>,
}

impl RejectThresholds {
    /// Parse five threshold labels leniently (see [`Likelihood::parse_threshold`]).
    pub fn parse(adult: &str, racy: &str, violence: &str, medical: &str, spoof: &str) -> Self {
        Self {
            adult: Likelihood::parse_threshold(adult),
            racy: Likelihood::parse_threshold(racy),
            violence: Likelihood::parse_threshold(violence),
            medical: Likelihood::parse_threshold(medical),
            spoof: Likelihood::parse_threshold(spoof),
        }
    }
}

/// Map a classification to an image status.
///
/// A missing classification (classifier unreachable) defers to manual review:
/// the image stays `Pending`, never silently approved or rejected. Once a
/// result exists the outcome is binary: any category at or above its configured
/// threshold rejects, otherwise the image is approved.
pub fn decide_image_status(
    result: Option<&SafeSearchResult>,
    thresholds: &RejectThresholds,
) -> ImageStatus {
    let Some(result) = result else {
        return ImageStatus::Pending;
    };

    let categories = [
        (result.adult, thresholds.adult),
        (result.racy, thresholds.racy),
        (result.violence, thresholds.violence),
        (result.medical, thresholds.medical),
        (result.spoof, thresholds.spoof),
    ];

    let rejected = categories
        .iter()
        .any(|(observed, threshold)| threshold.is_some_and(|min| *observed >= min));

    if rejected {
        ImageStatus::Rejected
    } else {
        ImageStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_likely_thresholds() -> RejectThresholds {
        RejectThresholds::parse("LIKELY", "LIKELY", "LIKELY", "LIKELY", "LIKELY")
    }

    fn all_very_unlikely() -> SafeSearchResult {
        SafeSearchResult {
            adult: Likelihood::VeryUnlikely,
            racy: Likelihood::VeryUnlikely,
            violence: Likelihood::VeryUnlikely,
            medical: Likelihood::VeryUnlikely,
            spoof: Likelihood::VeryUnlikely,
        }
    }

    #[test]
    fn ordinal_scale_is_ordered() {
        assert!(Likelihood::Unknown < Likelihood::VeryUnlikely);
        assert!(Likelihood::VeryUnlikely < Likelihood::Unlikely);
        assert!(Likelihood::Unlikely < Likelihood::Possible);
        assert!(Likelihood::Possible < Likelihood::Likely);
        assert!(Likelihood::Likely < Likelihood::VeryLikely);
    }

    #[test]
    fn clean_classification_is_approved() {
        let result = all_very_unlikely();
        assert_eq!(
            decide_image_status(Some(&result), &all_likely_thresholds()),
            ImageStatus::Approved
        );
    }

    #[test]
    fn single_category_at_threshold_rejects() {
        let result = SafeSearchResult {
            adult: Likelihood::Likely,
            ..all_very_unlikely()
        };
        assert_eq!(
            decide_image_status(Some(&result), &all_likely_thresholds()),
            ImageStatus::Rejected
        );
    }

    #[test]
    fn category_above_threshold_rejects() {
        let result = SafeSearchResult {
            violence: Likelihood::VeryLikely,
            ..all_very_unlikely()
        };
        assert_eq!(
            decide_image_status(Some(&result), &all_likely_thresholds()),
            ImageStatus::Rejected
        );
    }

    #[test]
    fn missing_classification_is_pending() {
        assert_eq!(
            decide_image_status(None, &all_likely_thresholds()),
            ImageStatus::Pending
        );
    }

    #[test]
    fn unset_threshold_never_rejects() {
        let thresholds = RejectThresholds::parse("", "", "", "", "");
        let result = SafeSearchResult {
            adult: Likelihood::VeryLikely,
            racy: Likelihood::VeryLikely,
            violence: Likelihood::VeryLikely,
            medical: Likelihood::VeryLikely,
            spoof: Likelihood::VeryLikely,
        };
        assert_eq!(
            decide_image_status(Some(&result), &thresholds),
            ImageStatus::Approved
        );
    }

    #[test]
    fn unparsable_threshold_degrades_to_never_reject() {
        let thresholds = RejectThresholds::parse("SOMEWHAT_LIKELY", "", "", "", "");
        assert_eq!(thresholds.adult, None);
        let result = SafeSearchResult {
            adult: Likelihood::VeryLikely,
            ..SafeSearchResult::default()
        };
        assert_eq!(
            decide_image_status(Some(&result), &thresholds),
            ImageStatus::Approved
        );
    }

    /// Raising any single category never moves a rejection back to approval.
    #[test]
    fn decision_is_monotonic_per_category() {
        let thresholds = all_likely_thresholds();
        let scale = [
            Likelihood::Unknown,
            Likelihood::VeryUnlikely,
            Likelihood::Unlikely,
            Likelihood::Possible,
            Likelihood::Likely,
            Likelihood::VeryLikely,
        ];

        for base in scale {
            let mut result = all_very_unlikely();
            result.racy = base;
            let before = decide_image_status(Some(&result), &thresholds);
            for higher in scale.iter().filter(|l| **l > base) {
                let mut raised = result;
                raised.racy = *higher;
                let after = decide_image_status(Some(&raised), &thresholds);
                if before == ImageStatus::Rejected {
                    assert_eq!(after, ImageStatus::Rejected);
                }
            }
        }
    }
}
