use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::TrackingSettings;
use crate::error::AppError;
use crate::geocode::ReverseGeocoder;
use crate::models::courier::Courier;
use crate::models::sample::LocationEvent;
use crate::observability::metrics::Metrics;
use crate::store::SampleStore;

pub struct AppState {
    pub couriers: DashMap<Uuid, Courier>,
    pub samples: SampleStore,
    pub location_events_tx: broadcast::Sender<LocationEvent>,
    pub geocoder: Option<ReverseGeocoder>,
    pub settings: TrackingSettings,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(settings: TrackingSettings, event_buffer_size: usize) -> Self {
        let (location_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            couriers: DashMap::new(),
            samples: SampleStore::new(),
            location_events_tx,
            geocoder: None,
            settings,
            metrics: Metrics::new(),
        }
    }

    /// Looks up a courier that may report locations and appear in queries.
    /// Unknown and ineligible couriers are both 404s to the caller.
    pub fn eligible_courier(&self, id: &Uuid) -> Result<Courier, AppError> {
        let courier = self
            .couriers
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))?;

        if !courier.is_eligible() {
            return Err(AppError::NotFound(format!("courier {id} is not active")));
        }

        Ok(courier.value().clone())
    }

    /// Courier lookup without the eligibility check, for read-only views of
    /// a courier that may have been deactivated.
    pub fn known_courier(&self, id: &Uuid) -> Result<Courier, AppError> {
        self.couriers
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("courier {id} not found")))
    }
}
