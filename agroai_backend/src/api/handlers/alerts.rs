//! Community alert feed.

use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::rewards::AlertDecision;

/// Most alerts retained in memory; older entries rotate out first.
pub const MAX_RETAINED_ALERTS: usize = 200;

/// An alert raised for surrounding farms after a severe detection.
#[derive(Debug, Clone, Serialize)]
pub struct CommunityAlert {
    pub id: u64,
    pub disease: String,
    pub severity: u8,
    pub location: String,
    pub confidence: f64,
    pub timestamp: String,
    pub status: &'static str,
}

impl CommunityAlert {
    pub fn from_decision(id: u64, decision: &AlertDecision) -> Self {
        Self {
            id,
            disease: decision.disease.clone(),
            severity: decision.severity,
            location: decision.location.clone(),
            confidence: decision.confidence,
            timestamp: Utc::now().to_rfc3339(),
            status: "active",
        }
    }
}

/// Append an alert, rotating out the oldest once the retention cap is hit.
/// Ids stay monotonic across rotation. Returns the new alert's id.
pub fn push_alert(alerts: &mut Vec<CommunityAlert>, decision: &AlertDecision) -> u64 {
    let id = alerts.last().map(|a| a.id + 1).unwrap_or(1);
    if alerts.len() >= MAX_RETAINED_ALERTS {
        alerts.remove(0);
    }
    alerts.push(CommunityAlert::from_decision(id, decision));
    id
}

/// `GET /community-alerts`
pub async fn community_alerts(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Vec<CommunityAlert>> {
    Json(state.alerts.read().await.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewards::{evaluate_community_alert, Confidence};

    fn decision() -> AlertDecision {
        evaluate_community_alert(
            "Tomato Late Blight",
            Confidence::from_raw(96.0).unwrap(),
            0.85,
            "Oregon",
        )
    }

    #[test]
    fn retention_is_capped_and_ids_stay_monotonic() {
        let mut alerts = Vec::new();
        for _ in 0..MAX_RETAINED_ALERTS + 50 {
            push_alert(&mut alerts, &decision());
        }
        assert_eq!(alerts.len(), MAX_RETAINED_ALERTS);
        // The 50 oldest rotated out; ids keep counting up.
        assert_eq!(alerts.first().map(|a| a.id), Some(51));
        assert_eq!(alerts.last().map(|a| a.id), Some((MAX_RETAINED_ALERTS + 50) as u64));
    }

    #[test]
    fn first_alert_gets_id_one() {
        let mut alerts = Vec::new();
        assert_eq!(push_alert(&mut alerts, &decision()), 1);
        assert_eq!(alerts[0].status, "active");
    }
}
