use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::models::sample::{GeoPoint, LocationSample};

/// Time and pagination bounds for a history read. `until` is exclusive so
/// an inclusive calendar day maps to `[day 00:00, next day 00:00)`.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub courier_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationStats {
    pub total_samples: u64,
    pub couriers_reporting: usize,
    pub first_captured_at: Option<DateTime<Utc>>,
    pub last_captured_at: Option<DateTime<Utc>>,
}

/// Append-only log of location samples, sharded per courier. Each courier's
/// samples are kept in `captured_at` order; appends and the retention sweep
/// take the courier's shard entry, so no further locking is needed.
pub struct SampleStore {
    per_courier: DashMap<Uuid, Vec<LocationSample>>,
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore {
    pub fn new() -> Self {
        Self {
            per_courier: DashMap::new(),
        }
    }

    /// Appends one sample stamped with the server clock. Every call creates
    /// a new sample; duplicate reports are log entries, not overwrites.
    pub fn append(
        &self,
        courier_id: Uuid,
        position: GeoPoint,
        accuracy_m: Option<f64>,
        address: Option<String>,
    ) -> LocationSample {
        self.append_at(courier_id, position, accuracy_m, address, Utc::now())
    }

    pub(crate) fn append_at(
        &self,
        courier_id: Uuid,
        position: GeoPoint,
        accuracy_m: Option<f64>,
        address: Option<String>,
        captured_at: DateTime<Utc>,
    ) -> LocationSample {
        let mut samples = self.per_courier.entry(courier_id).or_default();

        // Per-courier captured_at must never go backwards, even if the
        // clock does between two appends.
        let captured_at = match samples.last() {
            Some(last) if captured_at < last.captured_at => last.captured_at,
            _ => captured_at,
        };

        let sample = LocationSample {
            id: Uuid::new_v4(),
            courier_id,
            position,
            accuracy_m,
            address,
            captured_at,
        };

        samples.push(sample.clone());
        sample
    }

    /// The courier's current location: its newest sample, derived from the
    /// log on every call.
    pub fn latest(&self, courier_id: &Uuid) -> Option<LocationSample> {
        self.per_courier
            .get(courier_id)
            .and_then(|samples| samples.last().cloned())
    }

    /// Newest-first page of a courier's samples within the query bounds.
    /// `limit` is clamped to `page_max` silently.
    pub fn history(
        &self,
        courier_id: &Uuid,
        query: &HistoryQuery,
        page_max: usize,
    ) -> Vec<LocationSample> {
        let limit = query.limit.min(page_max);

        let Some(samples) = self.per_courier.get(courier_id) else {
            return Vec::new();
        };

        samples
            .iter()
            .rev()
            .filter(|sample| query.from.is_none_or(|from| sample.captured_at >= from))
            .filter(|sample| query.until.is_none_or(|until| sample.captured_at < until))
            .skip(query.offset)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self, filter: &StatsFilter) -> LocationStats {
        let mut total = 0u64;
        let mut reporting = 0usize;
        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;

        for entry in self.per_courier.iter() {
            if filter
                .courier_id
                .is_some_and(|courier_id| courier_id != *entry.key())
            {
                continue;
            }

            let mut matched = 0u64;
            for sample in entry.value().iter() {
                if filter.from.is_some_and(|from| sample.captured_at < from) {
                    continue;
                }
                if filter.until.is_some_and(|until| sample.captured_at >= until) {
                    continue;
                }
                matched += 1;
                if first.is_none_or(|ts| sample.captured_at < ts) {
                    first = Some(sample.captured_at);
                }
                if last.is_none_or(|ts| sample.captured_at > ts) {
                    last = Some(sample.captured_at);
                }
            }

            if matched > 0 {
                reporting += 1;
                total += matched;
            }
        }

        LocationStats {
            total_samples: total,
            couriers_reporting: reporting,
            first_captured_at: first,
            last_captured_at: last,
        }
    }

    /// Deletes every sample older than `cutoff` and reports how many were
    /// removed. Samples are immutable, so this never races an in-flight
    /// write beyond the per-shard lock.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;

        for mut entry in self.per_courier.iter_mut() {
            let samples = entry.value_mut();
            let keep_from = samples.partition_point(|sample| sample.captured_at < cutoff);
            samples.drain(..keep_from);
            removed += keep_from;
        }

        removed
    }

    pub fn sample_count(&self) -> usize {
        self.per_courier.iter().map(|entry| entry.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{HistoryQuery, SampleStore, StatsFilter};
    use crate::models::sample::GeoPoint;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    #[test]
    fn append_then_latest_round_trips_coordinates() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);

        store.append(courier, point(55.7558, 37.6176), Some(12.0), None);

        let latest = store.latest(&courier).unwrap();
        assert_eq!(latest.position.lat, 55.7558);
        assert_eq!(latest.position.lon, 37.6176);
        assert_eq!(latest.accuracy_m, Some(12.0));
    }

    #[test]
    fn latest_is_none_for_unknown_courier() {
        let store = SampleStore::new();
        assert!(store.latest(&Uuid::from_u128(9)).is_none());
    }

    #[test]
    fn repeated_reports_accumulate_as_log_entries() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);

        let first = store.append(courier, point(1.0, 1.0), None, None);
        let second = store.append(courier, point(1.0, 1.0), None, None);

        assert_ne!(first.id, second.id);
        assert_eq!(store.sample_count(), 2);
    }

    #[test]
    fn captured_at_never_goes_backwards_per_courier() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);
        let now = Utc::now();

        store.append_at(courier, point(1.0, 1.0), None, None, now);
        let clamped = store.append_at(courier, point(2.0, 2.0), None, None, now - Duration::seconds(30));

        assert_eq!(clamped.captured_at, now);
        assert_eq!(store.latest(&courier).unwrap().position.lat, 2.0);
    }

    #[test]
    fn history_is_newest_first_and_paginated() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);
        let base = Utc::now() - Duration::minutes(10);

        for i in 0..5 {
            store.append_at(
                courier,
                point(i as f64, 0.0),
                None,
                None,
                base + Duration::minutes(i),
            );
        }

        let query = HistoryQuery {
            limit: 2,
            offset: 1,
            ..Default::default()
        };
        let page = store.history(&courier, &query, 1000);

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].position.lat, 3.0);
        assert_eq!(page[1].position.lat, 2.0);
    }

    #[test]
    fn history_limit_is_clamped_to_page_max() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);
        let base = Utc::now() - Duration::minutes(30);

        for i in 0..10 {
            store.append_at(
                courier,
                point(0.0, i as f64),
                None,
                None,
                base + Duration::minutes(i),
            );
        }

        let query = HistoryQuery {
            limit: 5000,
            ..Default::default()
        };
        let page = store.history(&courier, &query, 4);

        assert_eq!(page.len(), 4);
    }

    #[test]
    fn history_respects_time_bounds() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);
        let base = Utc::now() - Duration::days(3);

        for day in 0..3 {
            store.append_at(
                courier,
                point(day as f64, 0.0),
                None,
                None,
                base + Duration::days(day),
            );
        }

        let query = HistoryQuery {
            from: Some(base + Duration::days(1)),
            until: Some(base + Duration::days(2)),
            limit: 100,
            offset: 0,
        };
        let page = store.history(&courier, &query, 1000);

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].position.lat, 1.0);
    }

    #[test]
    fn purge_removes_only_samples_older_than_cutoff() {
        let store = SampleStore::new();
        let courier = Uuid::from_u128(1);
        let now = Utc::now();

        store.append_at(courier, point(1.0, 1.0), None, None, now - Duration::days(40));
        store.append_at(courier, point(2.0, 2.0), None, None, now - Duration::days(31));
        store.append_at(courier, point(3.0, 3.0), None, None, now - Duration::days(5));

        let removed = store.purge_older_than(now - Duration::days(30));

        assert_eq!(removed, 2);
        assert_eq!(store.sample_count(), 1);
        assert_eq!(store.latest(&courier).unwrap().position.lat, 3.0);
    }

    #[test]
    fn purge_on_empty_store_removes_nothing() {
        let store = SampleStore::new();
        assert_eq!(store.purge_older_than(Utc::now()), 0);
    }

    #[test]
    fn stats_count_per_courier_and_overall() {
        let store = SampleStore::new();
        let c1 = Uuid::from_u128(1);
        let c2 = Uuid::from_u128(2);
        let now = Utc::now();

        store.append_at(c1, point(1.0, 1.0), None, None, now - Duration::hours(2));
        store.append_at(c1, point(1.1, 1.1), None, None, now - Duration::hours(1));
        store.append_at(c2, point(2.0, 2.0), None, None, now);

        let all = store.stats(&StatsFilter::default());
        assert_eq!(all.total_samples, 3);
        assert_eq!(all.couriers_reporting, 2);

        let only_c1 = store.stats(&StatsFilter {
            courier_id: Some(c1),
            ..Default::default()
        });
        assert_eq!(only_c1.total_samples, 2);
        assert_eq!(only_c1.couriers_reporting, 1);

        let recent = store.stats(&StatsFilter {
            from: Some(now - Duration::minutes(90)),
            ..Default::default()
        });
        assert_eq!(recent.total_samples, 2);
    }
}
