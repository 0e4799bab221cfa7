use serde::{Deserialize, Serialize};

/// Freshness tiers ordered from most to least recent. `OnDelivery` is a
/// staleness tier only (recently active but quiet); it makes no claim about
/// an actual delivery being in progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Active,
    OnDelivery,
    Inactive,
}

/// Derived at query time from the latest sample's age. Never persisted, so
/// it cannot drift from the underlying sample log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Presence {
    pub status: PresenceStatus,
    pub age_seconds: Option<i64>,
}
