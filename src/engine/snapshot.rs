use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::presence::{resolve_presence, PresenceThresholds};
use crate::models::presence::Presence;
use crate::models::sample::LocationSample;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct CourierSnapshot {
    pub courier_id: Uuid,
    pub name: String,
    pub branch_id: Option<String>,
    pub latest_sample: Option<LocationSample>,
    pub presence: Presence,
}

/// The map/dashboard read model: one row per eligible courier with its
/// latest sample and derived presence, computed from the sample log at
/// call time. Couriers with no sample yet are included with a null sample;
/// the consumer decides how to render "unknown location".
pub fn list_active_couriers(
    state: &AppState,
    branch_id: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<CourierSnapshot> {
    let thresholds = PresenceThresholds::from_settings(&state.settings);

    let mut rows: Vec<CourierSnapshot> = state
        .couriers
        .iter()
        .filter(|entry| entry.value().is_eligible())
        .filter(|entry| {
            branch_id.is_none_or(|branch| entry.value().branch_id.as_deref() == Some(branch))
        })
        .map(|entry| {
            let courier = entry.value();
            let latest_sample = state.samples.latest(&courier.id);
            let presence =
                resolve_presence(latest_sample.as_ref().map(|s| s.captured_at), now, &thresholds);

            CourierSnapshot {
                courier_id: courier.id,
                name: courier.name.clone(),
                branch_id: courier.branch_id.clone(),
                latest_sample,
                presence,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.courier_id.cmp(&b.courier_id)));
    rows
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::list_active_couriers;
    use crate::config::TrackingSettings;
    use crate::models::courier::{Courier, CourierRole};
    use crate::models::presence::PresenceStatus;
    use crate::models::sample::GeoPoint;
    use crate::state::AppState;

    fn add_courier(state: &AppState, seed: u128, name: &str, active: bool, role: CourierRole) {
        let id = Uuid::from_u128(seed);
        state.couriers.insert(
            id,
            Courier {
                id,
                name: name.to_string(),
                branch_id: None,
                active,
                role,
                registered_at: Utc::now(),
            },
        );
    }

    #[test]
    fn couriers_without_samples_are_kept_with_null_location() {
        let state = AppState::new(TrackingSettings::default(), 16);
        add_courier(&state, 1, "alice", true, CourierRole::Courier);
        add_courier(&state, 2, "bob", true, CourierRole::Courier);
        state
            .samples
            .append(Uuid::from_u128(1), GeoPoint { lat: 1.0, lon: 2.0 }, None, None);

        let rows = list_active_couriers(&state, None, Utc::now());

        assert_eq!(rows.len(), 2);
        assert!(rows[0].latest_sample.is_some());
        assert_eq!(rows[0].presence.status, PresenceStatus::Active);
        assert!(rows[1].latest_sample.is_none());
        assert_eq!(rows[1].presence.status, PresenceStatus::Inactive);
        assert_eq!(rows[1].presence.age_seconds, None);
    }

    #[test]
    fn inactive_and_staff_entries_are_excluded() {
        let state = AppState::new(TrackingSettings::default(), 16);
        add_courier(&state, 1, "alice", true, CourierRole::Courier);
        add_courier(&state, 2, "bob", false, CourierRole::Courier);
        add_courier(&state, 3, "carol", true, CourierRole::Staff);

        let rows = list_active_couriers(&state, None, Utc::now());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "alice");
    }
}
