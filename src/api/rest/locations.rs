use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::day_bounds;
use crate::engine::presence::{resolve_presence, PresenceThresholds};
use crate::engine::proximity::{find_nearby, NearbyCourier};
use crate::error::AppError;
use crate::geocode::spawn_address_resolution;
use crate::models::presence::Presence;
use crate::models::sample::{GeoPoint, LocationEvent, LocationSample};
use crate::state::AppState;
use crate::store::{LocationStats, StatsFilter};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/couriers/:id/location",
            get(last_location).post(record_location),
        )
        .route("/nearby", get(nearby_couriers))
        .route("/stats", get(location_stats))
}

#[derive(Deserialize)]
pub struct RecordLocationRequest {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct RecordLocationResponse {
    pub sample_id: Uuid,
    pub captured_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LastLocationResponse {
    pub courier_id: Uuid,
    pub sample: Option<LocationSample>,
    pub presence: Presence,
}

#[derive(Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub branch_id: Option<String>,
}

#[derive(Deserialize)]
pub struct StatsParams {
    pub courier_id: Option<Uuid>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

async fn record_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordLocationRequest>,
) -> Result<Json<RecordLocationResponse>, AppError> {
    let result = try_record_location(&state, id, payload);

    let outcome = if result.is_ok() { "success" } else { "rejected" };
    state
        .metrics
        .samples_recorded_total
        .with_label_values(&[outcome])
        .inc();

    result
}

fn try_record_location(
    state: &Arc<AppState>,
    id: Uuid,
    payload: RecordLocationRequest,
) -> Result<Json<RecordLocationResponse>, AppError> {
    let courier = state.eligible_courier(&id)?;
    let position = GeoPoint::validated(payload.lat, payload.lon)?;

    let had_address = payload.address.is_some();
    let sample = state
        .samples
        .append(courier.id, position, payload.accuracy_m, payload.address);

    let _ = state.location_events_tx.send(LocationEvent::SampleRecorded {
        sample: sample.clone(),
    });

    // Address enrichment is best-effort and stays off the ingest path.
    if !had_address {
        spawn_address_resolution(state.clone(), sample.clone());
    }

    tracing::debug!(
        courier_id = %courier.id,
        sample_id = %sample.id,
        lat = sample.position.lat,
        lon = sample.position.lon,
        "location recorded"
    );

    Ok(Json(RecordLocationResponse {
        sample_id: sample.id,
        captured_at: sample.captured_at,
    }))
}

async fn last_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LastLocationResponse>, AppError> {
    let courier = state.known_courier(&id)?;

    let sample = state.samples.latest(&courier.id);
    let thresholds = PresenceThresholds::from_settings(&state.settings);
    let presence = resolve_presence(
        sample.as_ref().map(|s| s.captured_at),
        Utc::now(),
        &thresholds,
    );

    Ok(Json(LastLocationResponse {
        courier_id: courier.id,
        sample,
        presence,
    }))
}

async fn nearby_couriers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<NearbyCourier>>, AppError> {
    let origin = GeoPoint::validated(params.lat, params.lon)?;
    if !params.radius_km.is_finite() {
        return Err(AppError::Validation("radius_km must be finite".to_string()));
    }

    let start = Instant::now();
    let rows = find_nearby(
        &state,
        &origin,
        params.radius_km,
        params.branch_id.as_deref(),
        Utc::now(),
    );
    state
        .metrics
        .nearby_query_seconds
        .observe(start.elapsed().as_secs_f64());

    Ok(Json(rows))
}

async fn location_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<LocationStats>, AppError> {
    let (from, until) = day_bounds(params.date_from.as_deref(), params.date_to.as_deref())?;

    let filter = StatsFilter {
        courier_id: params.courier_id,
        from,
        until,
    };

    Ok(Json(state.samples.stats(&filter)))
}
