use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Rejects non-finite values and coordinates outside the WGS84 ranges.
    pub fn validated(lat: f64, lon: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(format!(
                "latitude {lat} out of range [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::Validation(format!(
                "longitude {lon} out of range [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// One timestamped location report. Immutable once appended; only the
/// retention sweep ever removes samples, and only by age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    pub id: Uuid,
    pub courier_id: Uuid,
    pub position: GeoPoint,
    pub accuracy_m: Option<f64>,
    pub address: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Events published to subscribers (the `/ws` stream) as samples land.
/// Address resolution arrives as a separate event because geocoding runs
/// off the ingest path and stored samples are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationEvent {
    SampleRecorded {
        sample: LocationSample,
    },
    AddressResolved {
        courier_id: Uuid,
        sample_id: Uuid,
        address: String,
    },
}
