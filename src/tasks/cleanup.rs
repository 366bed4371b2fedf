//! Expiry Sweep
//!
//! Periodically drops expired cache entries so memory does not hold stale
//! sleep records that are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::{CacheStatsSnapshot, CacheStore};

/// Outcome of one sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub removed: usize,
    /// Cache state right after the sweep
    pub after: CacheStatsSnapshot,
}

/// Runs one sweep under a single write lock.
pub async fn sweep_expired(cache: &RwLock<CacheStore>) -> SweepReport {
    let mut store = cache.write().await;
    let removed = store.clear_expired();
    SweepReport {
        removed,
        after: store.stats(),
    }
}

/// Spawns the sweep loop. The first sweep runs one full interval after the
/// call; intervals of 0 are treated as 1 second. Abort the handle to stop it.
pub fn spawn_cleanup_task(
    cache: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let period = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(interval_secs = period.as_secs(), "cache sweep started");

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = sweep_expired(&cache).await;

            if report.removed > 0 {
                info!(
                    removed = report.removed,
                    size = report.after.size,
                    namespaces = report.after.namespace_count,
                    "expired sleep data swept"
                );
            } else {
                debug!(size = report.after.size, "sweep found nothing expired");
            }
        }
    })
}
