pub mod couriers;
pub mod locations;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(couriers::router())
        .merge(locations::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    couriers: usize,
    samples: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        couriers: state.couriers.len(),
        samples: state.samples.sample_count(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

/// Maps optional `YYYY-MM-DD` query values to inclusive day bounds: the
/// lower bound is that day's midnight, the upper bound is exclusive at the
/// following midnight.
pub(crate) fn day_bounds(
    date_from: Option<&str>,
    date_to: Option<&str>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
    let from = date_from
        .map(|raw| parse_day(raw, "date_from"))
        .transpose()?
        .map(|day| day.and_time(NaiveTime::MIN).and_utc());

    let until = date_to
        .map(|raw| parse_day(raw, "date_to"))
        .transpose()?
        .map(|day| {
            day.succ_opt()
                .map(|next| next.and_time(NaiveTime::MIN).and_utc())
                .ok_or_else(|| AppError::Validation("date_to out of range".to_string()))
        })
        .transpose()?;

    Ok((from, until))
}

fn parse_day(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}
