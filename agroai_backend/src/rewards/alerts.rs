use serde::{Deserialize, Serialize};

use super::token_rewards::{is_healthy_label, Confidence};

/// Community alert decision for one detection.
///
/// `severity` is the alert tier (1 low, 2 medium, 3 high), distinct from the
/// 0-1 disease severity the classifier reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub should_alert: bool,
    pub severity: u8,
    pub disease: String,
    pub location: String,
    pub confidence: f64,
}

/// Decide whether a detection should raise a community alert.
///
/// Only high-confidence, non-trivial detections of an actual disease alert
/// the surrounding farms.
pub fn evaluate_community_alert(
    disease: &str,
    confidence: Confidence,
    severity: f64,
    location: &str,
) -> AlertDecision {
    let label = disease.trim().to_lowercase();
    let pct = confidence.percent();

    let should_alert = !is_healthy_label(&label) && pct > 80.0 && severity > 0.5;

    let severity_tier = if pct >= 95.0 && severity > 0.8 {
        3
    } else if pct > 85.0 && severity > 0.6 {
        2
    } else {
        1
    };

    AlertDecision {
        should_alert,
        severity: severity_tier,
        disease: label,
        location: location.to_string(),
        confidence: pct,
    }
}
