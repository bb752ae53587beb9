use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Flat AGRO reward for any accepted photo upload.
pub const BASE_PHOTO_REWARD: u64 = 5;

/// Bonus paid for a confirmed-healthy plant photo.
pub const HEALTHY_BONUS: u64 = 20;

/// Labels treated as "no disease present" by the reward and alert policies.
pub const HEALTHY_LABELS: [&str; 3] = ["healthy", "no disease", "unknown"];

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("confidence {0} is outside the accepted 0-100 range")]
    ConfidenceOutOfRange(f64),
}

/// Detection confidence on the canonical 0-100 scale.
///
/// Producers are inconsistent about units: the classifier's softmax emits
/// fractions in `[0, 1]` while percentage values arrive from mock and client
/// paths. [`Confidence::from_raw`] is the single place the unit is decided;
/// everything downstream works in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

// Incoming values take the same normalization path as every other producer;
// a raw number on the wire cannot smuggle in an unnormalized confidence.
impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl Confidence {
    /// Normalize a raw confidence value to the 0-100 scale.
    ///
    /// Values in `[0, 1]` are read as fractions and scaled by 100; values in
    /// `(1, 100]` are read as percentages. Negative, non-finite or above-100
    /// values are rejected rather than silently misclassified.
    pub fn from_raw(raw: f64) -> Result<Self, RewardError> {
        if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
            return Err(RewardError::ConfidenceOutOfRange(raw));
        }
        if raw <= 1.0 {
            Ok(Self(raw * 100.0))
        } else {
            Ok(Self(raw))
        }
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

/// Token reward decision for one analyzed photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardDecision {
    pub base_reward: u64,
    pub bonus_reward: u64,
    pub total_reward: u64,
    pub is_early_detection: bool,
    pub confidence_threshold_met: bool,
}

/// Map an AI detection result to an AGRO token reward.
///
/// Every upload earns the flat base reward. Detected diseases earn a bonus
/// scaled by confidence, with the >90% band flagged as an early detection.
pub fn calculate_token_reward(disease: &str, confidence: Confidence) -> RewardDecision {
    let pct = confidence.percent();
    let (bonus_reward, is_early_detection) = if is_healthy_label(disease) {
        (HEALTHY_BONUS, false)
    } else if pct > 90.0 {
        (200, true)
    } else if pct > 70.0 {
        (100, false)
    } else {
        (50, false)
    };

    RewardDecision {
        base_reward: BASE_PHOTO_REWARD,
        bonus_reward,
        total_reward: BASE_PHOTO_REWARD + bonus_reward,
        is_early_detection,
        confidence_threshold_met: pct > 70.0,
    }
}

/// True when the label means "no disease worth rewarding or alerting on".
pub fn is_healthy_label(disease: &str) -> bool {
    let label = disease.trim().to_lowercase();
    label.is_empty() || HEALTHY_LABELS.contains(&label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(value: f64) -> Confidence {
        Confidence::from_raw(value).unwrap()
    }

    #[test]
    fn high_confidence_disease_is_early_detection() {
        let decision = calculate_token_reward("Tomato Late Blight", pct(95.0));
        assert_eq!(decision.bonus_reward, 200);
        assert_eq!(decision.total_reward, 205);
        assert!(decision.is_early_detection);
        assert!(decision.confidence_threshold_met);
    }

    #[test]
    fn mid_confidence_disease_gets_standard_bonus() {
        let decision = calculate_token_reward("Apple Scab", pct(82.0));
        assert_eq!(decision.bonus_reward, 100);
        assert!(!decision.is_early_detection);
    }

    #[test]
    fn low_confidence_disease_gets_reduced_bonus() {
        let decision = calculate_token_reward("Common Rust", pct(60.0));
        assert_eq!(decision.bonus_reward, 50);
        assert!(!decision.confidence_threshold_met);
    }

    #[test]
    fn healthy_plant_gets_healthy_bonus_at_any_confidence() {
        for label in ["Healthy", "healthy", "No Disease", "unknown", "", "  "] {
            let decision = calculate_token_reward(label, pct(98.0));
            assert_eq!(decision.bonus_reward, HEALTHY_BONUS, "label {label:?}");
            assert_eq!(decision.total_reward, 25);
            assert!(!decision.is_early_detection);
        }
    }

    #[test]
    fn total_is_always_base_plus_bonus() {
        for conf in [0.0, 50.0, 71.0, 90.5, 100.0] {
            let decision = calculate_token_reward("Late Blight", pct(conf));
            assert_eq!(
                decision.total_reward,
                decision.base_reward + decision.bonus_reward
            );
            assert!(decision.total_reward >= decision.base_reward);
        }
    }

    #[test]
    fn fractional_confidence_is_scaled_to_percent() {
        assert_eq!(Confidence::from_raw(0.95).unwrap().percent(), 95.0);
        assert_eq!(Confidence::from_raw(1.0).unwrap().percent(), 100.0);
        assert_eq!(Confidence::from_raw(95.0).unwrap().percent(), 95.0);
    }

    #[test]
    fn deserialization_normalizes_like_from_raw() {
        let fraction: Confidence = serde_json::from_str("0.95").unwrap();
        assert_eq!(fraction.percent(), 95.0);
        let percent: Confidence = serde_json::from_str("97.5").unwrap();
        assert_eq!(percent.percent(), 97.5);
        assert!(serde_json::from_str::<Confidence>("250.0").is_err());
        assert!(serde_json::from_str::<Confidence>("-1.0").is_err());
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        assert!(Confidence::from_raw(-0.1).is_err());
        assert!(Confidence::from_raw(100.5).is_err());
        assert!(Confidence::from_raw(f64::NAN).is_err());
        assert!(Confidence::from_raw(f64::INFINITY).is_err());
    }
}
