//! Image safe-search classification
//!
//! AWS Rekognition moderation labels are mapped onto five ordinal categories
//! (adult, racy, violence, medical, spoof). The classifier is behind a trait so
//! the image service can be tested without network access.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rekognition::Client as RekognitionClient;
use staywork_core::{AppError, AppResult, Likelihood, SafeSearchResult};

/// Classifies raw image bytes into per-category likelihoods.
#[async_trait]
pub trait SafeSearchClassifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> AppResult<SafeSearchResult>;
}

/// Moderation categories we aggregate Rekognition labels into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Adult,
    Racy,
    Violence,
    Medical,
    Spoof,
}

/// Map a Rekognition moderation label name onto one of our categories.
/// Unrecognized labels are ignored.
fn categorize_label(name: &str) -> Option<Category> {
    match name {
        "Explicit Nudity" | "Nudity" | "Sexual Activity" | "Graphic Nudity"
        | "Explicit Sexual Activity" | "Adult Toys" => Some(Category::Adult),
        "Suggestive" | "Partial Nudity" | "Revealing Clothes" | "Swimwear Or Underwear"
        | "Female Swimwear Or Underwear" | "Male Swimwear Or Underwear" => Some(Category::Racy),
        "Violence" | "Graphic Violence" | "Graphic Violence Or Gore" | "Weapons"
        | "Weapon Violence" | "Physical Violence" | "Self Injury" => Some(Category::Violence),
        "Visually Disturbing" | "Drugs" | "Drugs & Tobacco" | "Pills"
        | "Drug Products" | "Drug Use" | "Emaciated Bodies" | "Corpses" => Some(Category::Medical),
        "Rude Gestures" | "Middle Finger" | "Hate Symbols" | "Nazi Party"
        | "White Supremacy" | "Extremist" => Some(Category::Spoof),
        _ => None,
    }
}

/// Convert a Rekognition confidence (0-100) to an ordinal likelihood.
fn confidence_to_likelihood(confidence: f32) -> Likelihood {
    if confidence >= 95.0 {
        Likelihood::VeryLikely
    } else if confidence >= 80.0 {
        Likelihood::Likely
    } else if confidence >= 60.0 {
        Likelihood::Possible
    } else if confidence >= 40.0 {
        Likelihood::Unlikely
    } else {
        Likelihood::VeryUnlikely
    }
}

/// AWS Rekognition implementation.
#[derive(Clone)]
pub struct RekognitionClassifier {
    client: RekognitionClient,
    min_confidence: f32,
}

impl RekognitionClassifier {
    const DEFAULT_MIN_CONFIDENCE: f32 = 20.0;

    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: RekognitionClient::new(&config),
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
        }
    }

    fn aggregate(labels: &[(String, f32)]) -> SafeSearchResult {
        let mut result = SafeSearchResult {
            adult: Likelihood::VeryUnlikely,
            racy: Likelihood::VeryUnlikely,
            violence: Likelihood::VeryUnlikely,
            medical: Likelihood::VeryUnlikely,
            spoof: Likelihood::VeryUnlikely,
        };

        for (name, confidence) in labels {
            let Some(category) = categorize_label(name) else {
                continue;
            };
            let likelihood = confidence_to_likelihood(*confidence);
            let slot = match category {
                Category::Adult => &mut result.adult,
                Category::Racy => &mut result.racy,
                Category::Violence => &mut result.violence,
                Category::Medical => &mut result.medical,
                Category::Spoof => &mut result.spoof,
            };
            if likelihood > *slot {
                *slot = likelihood;
            }
        }

        result
    }
}

#[async_trait]
impl SafeSearchClassifier for RekognitionClassifier {
    #[tracing::instrument(skip(self, image), fields(image_size = image.len()))]
    async fn classify(&self, image: &[u8]) -> AppResult<SafeSearchResult> {
        use aws_sdk_rekognition::types::Image;

        let rekognition_image = Image::builder()
            .bytes(aws_sdk_rekognition::primitives::Blob::new(image))
            .build();

        let response = self
            .client
            .detect_moderation_labels()
            .image(rekognition_image)
            .min_confidence(self.min_confidence)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalService(format!("Rekognition moderation failed: {}", e))
            })?;

        let mut labels = Vec::new();
        for label in response.moderation_labels() {
            let name = label.name().unwrap_or_default().to_string();
            let confidence = label.confidence().unwrap_or(0.0);
            // Parent names carry the broad category when the leaf is specific.
            if let Some(parent) = label.parent_name() {
                if !parent.is_empty() {
                    labels.push((parent.to_string(), confidence));
                }
            }
            labels.push((name, confidence));
        }

        let result = Self::aggregate(&labels);

        tracing::info!(
            label_count = labels.len(),
            adult = ?result.adult,
            racy = ?result.racy,
            violence = ?result.violence,
            "Image classified"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlabeled_image_is_very_unlikely_everywhere() {
        let result = RekognitionClassifier::aggregate(&[]);
        assert_eq!(result.adult, Likelihood::VeryUnlikely);
        assert_eq!(result.spoof, Likelihood::VeryUnlikely);
    }

    #[test]
    fn high_confidence_nudity_is_very_likely_adult() {
        let result = RekognitionClassifier::aggregate(&[("Explicit Nudity".to_string(), 98.5)]);
        assert_eq!(result.adult, Likelihood::VeryLikely);
        assert_eq!(result.racy, Likelihood::VeryUnlikely);
    }

    #[test]
    fn strongest_label_wins_per_category() {
        let result = RekognitionClassifier::aggregate(&[
            ("Violence".to_string(), 45.0),
            ("Weapons".to_string(), 85.0),
        ]);
        assert_eq!(result.violence, Likelihood::Likely);
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let result = RekognitionClassifier::aggregate(&[("Gambling".to_string(), 99.0)]);
        assert_eq!(result.adult, Likelihood::VeryUnlikely);
        assert_eq!(result.violence, Likelihood::VeryUnlikely);
    }

    #[test]
    fn confidence_bands_are_monotonic() {
        assert!(confidence_to_likelihood(99.0) > confidence_to_likelihood(85.0));
        assert!(confidence_to_likelihood(85.0) > confidence_to_likelihood(65.0));
        assert!(confidence_to_likelihood(65.0) > confidence_to_likelihood(45.0));
        assert!(confidence_to_likelihood(45.0) > confidence_to_likelihood(10.0));
    }
}
