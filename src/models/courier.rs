use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CourierRole {
    Courier,
    Staff,
}

/// A courier as this service sees it. Lifecycle (hiring, deactivation) is
/// owned elsewhere; only identity and eligibility are read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: Uuid,
    pub name: String,
    pub branch_id: Option<String>,
    pub active: bool,
    pub role: CourierRole,
    pub registered_at: DateTime<Utc>,
}

impl Courier {
    /// Only active couriers in the courier role can report locations or
    /// appear in proximity and snapshot results.
    pub fn is_eligible(&self) -> bool {
        self.active && self.role == CourierRole::Courier
    }
}
