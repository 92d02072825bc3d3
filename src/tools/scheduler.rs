//! Auto-run scheduler
//!
//! Decides, for tools flagged for automatic refresh, whether a new run is
//! due. Invoked by the assessment pipeline immediately before composing
//! model-facing context; the core never polls on a background timer.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::tools::descriptor::ToolDescriptor;
use crate::tools::result::RunResult;
use crate::tools::store::ResultStore;

/// A cached result is stale when it is absent, older than the refresh
/// interval, or unsuccessful.
pub fn is_stale(
    result: Option<&RunResult>,
    refresh_interval: Duration,
    now: DateTime<Utc>,
) -> bool {
    match result {
        None => true,
        Some(r) => {
            if !r.success {
                return true;
            }
            r.age_ms(now) > refresh_interval.as_millis() as i64
        }
    }
}

/// Ids of enabled auto-run descriptors whose cached result is stale
pub fn stale_ids(
    descriptors: &[ToolDescriptor],
    store: &ResultStore,
    now: DateTime<Utc>,
) -> Vec<String> {
    descriptors
        .iter()
        .filter(|d| d.enabled && d.auto_run)
        .filter(|d| is_stale(store.get(&d.id).as_ref(), d.refresh_interval(), now))
        .map(|d| d.id.clone())
        .collect()
}
