use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::day_bounds;
use crate::engine::snapshot::{list_active_couriers, CourierSnapshot};
use crate::error::AppError;
use crate::models::courier::{Courier, CourierRole};
use crate::models::sample::LocationSample;
use crate::state::AppState;
use crate::store::HistoryQuery;

const DEFAULT_HISTORY_PAGE: usize = 100;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers", post(register_courier).get(active_couriers))
        .route("/couriers/:id/active", patch(set_courier_active))
        .route("/couriers/:id/history", get(courier_history))
}

#[derive(Deserialize)]
pub struct RegisterCourierRequest {
    pub name: String,
    pub branch_id: Option<String>,
    pub role: Option<CourierRole>,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Deserialize)]
pub struct SnapshotParams {
    pub branch_id: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

async fn register_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterCourierRequest>,
) -> Result<Json<Courier>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let courier = Courier {
        id: Uuid::new_v4(),
        name: payload.name,
        branch_id: payload.branch_id,
        active: true,
        role: payload.role.unwrap_or(CourierRole::Courier),
        registered_at: Utc::now(),
    };

    state.couriers.insert(courier.id, courier.clone());
    state
        .metrics
        .couriers_registered
        .set(state.couriers.len() as i64);

    tracing::info!(courier_id = %courier.id, name = %courier.name, "courier registered");

    Ok(Json(courier))
}

async fn set_courier_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<Courier>, AppError> {
    let mut courier = state
        .couriers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

    courier.active = payload.active;

    Ok(Json(courier.clone()))
}

async fn active_couriers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SnapshotParams>,
) -> Json<Vec<CourierSnapshot>> {
    let rows = list_active_couriers(&state, params.branch_id.as_deref(), Utc::now());
    Json(rows)
}

async fn courier_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<LocationSample>>, AppError> {
    state.known_courier(&id)?;

    let (from, until) = day_bounds(params.date_from.as_deref(), params.date_to.as_deref())?;
    let query = HistoryQuery {
        from,
        until,
        limit: params.limit.unwrap_or(DEFAULT_HISTORY_PAGE),
        offset: params.offset.unwrap_or(0),
    };

    let page = state
        .samples
        .history(&id, &query, state.settings.history_page_max);

    Ok(Json(page))
}
