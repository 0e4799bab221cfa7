use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;

use crate::state::AppState;

/// Periodic sweep deleting samples older than the retention horizon. Runs
/// for the life of the process; the interval is configuration (daily by
/// default), never per-request.
pub async fn run_retention_sweep(state: Arc<AppState>, interval: Duration) {
    info!(
        retention_days = state.settings.retention_days,
        interval_secs = interval.as_secs(),
        "retention sweep started"
    );

    let mut ticker = tokio::time::interval(interval);
    // The first tick fires immediately; skip it so startup is not a sweep.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let cutoff = Utc::now() - ChronoDuration::days(state.settings.retention_days);
        let removed = state.samples.purge_older_than(cutoff);
        state.metrics.samples_purged_total.inc_by(removed as u64);

        info!(removed, %cutoff, "retention sweep completed");
    }
}
