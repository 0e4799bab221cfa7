use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::sample::{GeoPoint, LocationEvent, LocationSample};
use crate::state::AppState;

/// Client for a Nominatim-style reverse geocoding endpoint. Optional: when
/// unconfigured, samples simply keep whatever address the courier reported.
#[derive(Debug, Clone)]
pub struct ReverseGeocoder {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ReverseResponse {
    display_name: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("geocoder client: {err}")))?;

        Ok(Self { client, base_url })
    }

    pub async fn reverse(&self, point: &GeoPoint) -> Result<String, AppError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await
            .map_err(|err| AppError::Upstream(format!("reverse geocode request: {err}")))?
            .error_for_status()
            .map_err(|err| AppError::Upstream(format!("reverse geocode status: {err}")))?;

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|err| AppError::Upstream(format!("reverse geocode body: {err}")))?;

        Ok(body.display_name)
    }
}

/// Best-effort address resolution for a freshly appended sample. Runs in a
/// detached task so ingest never waits on the map provider; the stored
/// sample stays as recorded and the result goes out as an event. Failures
/// are logged and swallowed.
pub fn spawn_address_resolution(state: Arc<AppState>, sample: LocationSample) {
    if state.geocoder.is_none() {
        return;
    }

    tokio::spawn(async move {
        let geocoder = match &state.geocoder {
            Some(geocoder) => geocoder,
            None => return,
        };

        match geocoder.reverse(&sample.position).await {
            Ok(address) => {
                debug!(courier_id = %sample.courier_id, sample_id = %sample.id, "address resolved");
                let _ = state.location_events_tx.send(LocationEvent::AddressResolved {
                    courier_id: sample.courier_id,
                    sample_id: sample.id,
                    address,
                });
            }
            Err(err) => {
                warn!(
                    courier_id = %sample.courier_id,
                    sample_id = %sample.id,
                    error = %err,
                    "reverse geocode failed"
                );
            }
        }
    });
}
