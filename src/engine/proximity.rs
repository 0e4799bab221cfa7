use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::presence::{resolve_presence, PresenceThresholds};
use crate::geo::haversine_km;
use crate::models::presence::Presence;
use crate::models::sample::{GeoPoint, LocationSample};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct NearbyCourier {
    pub courier_id: Uuid,
    pub name: String,
    pub distance_km: f64,
    pub sample: LocationSample,
    pub presence: Presence,
}

/// Radius search over eligible couriers' latest samples. Couriers without a
/// sample, or whose latest sample is older than the freshness window, are
/// excluded. Results are ascending by distance, ties broken by courier id
/// so repeated queries are deterministic.
pub fn find_nearby(
    state: &AppState,
    origin: &GeoPoint,
    radius_km: f64,
    branch_id: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<NearbyCourier> {
    if radius_km <= 0.0 {
        return Vec::new();
    }

    let freshness_window = Duration::minutes(state.settings.freshness_window_minutes);
    let thresholds = PresenceThresholds::from_settings(&state.settings);

    let mut matches: Vec<NearbyCourier> = state
        .couriers
        .iter()
        .filter(|entry| entry.value().is_eligible())
        .filter(|entry| {
            branch_id.is_none_or(|branch| entry.value().branch_id.as_deref() == Some(branch))
        })
        .filter_map(|entry| {
            let courier = entry.value();
            let sample = state.samples.latest(&courier.id)?;

            if now - sample.captured_at > freshness_window {
                return None;
            }

            let distance_km = haversine_km(origin, &sample.position);
            if distance_km > radius_km {
                return None;
            }

            let presence = resolve_presence(Some(sample.captured_at), now, &thresholds);

            Some(NearbyCourier {
                courier_id: courier.id,
                name: courier.name.clone(),
                distance_km,
                sample,
                presence,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.courier_id.cmp(&b.courier_id))
    });

    matches
}
