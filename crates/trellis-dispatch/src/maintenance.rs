use std::sync::Arc;

use tokio::task::JoinHandle;
use trellis_metrics::MetricsAggregator;
use trellis_store::SessionStore;

use crate::config::DispatchConfig;

/// Spawns the housekeeping task: evicts conversations idle past the TTL
/// and prunes metric buckets past retention. The sweep only probes slot
/// locks, so it can never stall behind an in-flight dispatch.
pub fn spawn_maintenance(
    store: Arc<SessionStore>,
    metrics: Arc<MetricsAggregator>,
    config: &DispatchConfig,
) -> JoinHandle<()> {
    let sweep_interval = config.maintenance_interval;
    let thread_ttl = config.thread_ttl;
    let bucket_retention = config.bucket_retention;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let evicted = store.evict_idle(thread_ttl).await;
            let pruned = metrics.prune_buckets(bucket_retention);
            if evicted > 0 || pruned > 0 {
                log::info!("maintenance sweep: evicted {evicted} threads, pruned {pruned} buckets");
            }
        }
    })
}
