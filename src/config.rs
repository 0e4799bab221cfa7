use std::env;

use crate::error::AppError;

/// Tunables for presence derivation, proximity eligibility, history paging
/// and retention. Defaults match the documented service behavior.
#[derive(Debug, Clone)]
pub struct TrackingSettings {
    pub freshness_window_minutes: i64,
    pub active_threshold_minutes: i64,
    pub stale_threshold_minutes: i64,
    pub history_page_max: usize,
    pub retention_days: i64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            freshness_window_minutes: 60,
            active_threshold_minutes: 5,
            stale_threshold_minutes: 30,
            history_page_max: 1000,
            retention_days: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub retention_sweep_minutes: u64,
    pub geocoder_url: Option<String>,
    pub geocoder_timeout_secs: u64,
    pub tracking: TrackingSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            retention_sweep_minutes: parse_or_default("RETENTION_SWEEP_MINUTES", 1440)?,
            geocoder_url: env::var("GEOCODER_URL").ok(),
            geocoder_timeout_secs: parse_or_default("GEOCODER_TIMEOUT_SECS", 10)?,
            tracking: TrackingSettings {
                freshness_window_minutes: parse_or_default("FRESHNESS_WINDOW_MINUTES", 60)?,
                active_threshold_minutes: parse_or_default("ACTIVE_THRESHOLD_MINUTES", 5)?,
                stale_threshold_minutes: parse_or_default("STALE_THRESHOLD_MINUTES", 30)?,
                history_page_max: parse_or_default("HISTORY_PAGE_MAX", 1000)?,
                retention_days: parse_or_default("RETENTION_DAYS", 30)?,
            },
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
