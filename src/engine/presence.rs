use chrono::{DateTime, Duration, Utc};

use crate::config::TrackingSettings;
use crate::models::presence::{Presence, PresenceStatus};

#[derive(Debug, Clone, Copy)]
pub struct PresenceThresholds {
    pub active: Duration,
    pub stale: Duration,
}

impl PresenceThresholds {
    pub fn from_settings(settings: &TrackingSettings) -> Self {
        Self {
            active: Duration::minutes(settings.active_threshold_minutes),
            stale: Duration::minutes(settings.stale_threshold_minutes),
        }
    }
}

/// Pure staleness tiering over the latest sample's age. No sample means
/// `inactive` with no age. Applied everywhere a status is shown, so there
/// is no stored status to drift from the log.
pub fn resolve_presence(
    latest_captured_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    thresholds: &PresenceThresholds,
) -> Presence {
    let Some(captured_at) = latest_captured_at else {
        return Presence {
            status: PresenceStatus::Inactive,
            age_seconds: None,
        };
    };

    let age = now - captured_at;
    let status = if age <= thresholds.active {
        PresenceStatus::Active
    } else if age <= thresholds.stale {
        PresenceStatus::OnDelivery
    } else {
        PresenceStatus::Inactive
    };

    Presence {
        status,
        age_seconds: Some(age.num_seconds()),
    }
}
