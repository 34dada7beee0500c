//! Best-effort work scheduled after a response is produced.

use std::{sync::Arc, time::Duration};

use chat_log_store::{LogStore, retention};
use rag_chain::ChatPipeline;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Idle time after which a session's in-process history is dropped.
pub fn idle_threshold(max_age_hours: u32) -> Duration {
    Duration::from_secs(u64::from(max_age_hours) * 3600)
}

/// Spawns a detached retention sweep.
///
/// Deletes logged interactions older than `max_age_hours` and drops
/// conversation histories idle for the same period. The caller never awaits
/// it; failures are logged and dropped.
pub fn spawn_retention_sweep(
    store: Arc<dyn LogStore>,
    pipeline: Arc<dyn ChatPipeline>,
    max_age_hours: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match retention::sweep(store.as_ref(), max_age_hours).await {
            Ok(deleted) => debug!(deleted, max_age_hours, "background retention sweep done"),
            Err(e) => warn!(error = %e, max_age_hours, "background retention sweep failed"),
        }
        let evicted = pipeline.evict_idle(idle_threshold(max_age_hours)).await;
        debug!(evicted, max_age_hours, "idle conversation memory evicted");
    })
}
