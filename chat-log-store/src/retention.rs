//! Age-based retention of interaction logs.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::{LogStore, errors::Result};

/// Default age threshold for both the post-chat sweep and the cleanup endpoint.
pub const DEFAULT_MAX_AGE_HOURS: u32 = 72;

/// Rows with `date_processed` strictly before this instant are expired.
///
/// Ages reaching past the earliest representable instant clamp to it, so
/// such a sweep deletes nothing.
pub fn cutoff_at(now: DateTime<Utc>, max_age_hours: u32) -> DateTime<Utc> {
    Duration::try_hours(i64::from(max_age_hours))
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Deletes every record older than `max_age_hours`, returning how many went.
///
/// Errors are returned as is; whether they matter is the caller's decision.
pub async fn sweep(store: &dyn LogStore, max_age_hours: u32) -> Result<u64> {
    let cutoff = cutoff_at(Utc::now(), max_age_hours);
    if cutoff == DateTime::<Utc>::MIN_UTC {
        info!(max_age_hours, "retention cutoff before the earliest instant, nothing to delete");
        return Ok(0);
    }
    let deleted = store.delete_older_than(cutoff).await?;
    info!(
        max_age_hours,
        %cutoff,
        deleted,
        backend = store.backend_name(),
        "retention sweep finished"
    );
    Ok(deleted)
}
