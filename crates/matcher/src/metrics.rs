// Metrics hooks for the matcher crate.
//
// Install a global `MatchMetrics` implementation via [`set_match_metrics`] and
// every `Matcher` reports latency, hit counts and per-field storage failures
// for each lookup. The crate itself stays free of any metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::{AcceptMode, LookupKind};

/// Metrics observer for lookups.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of one lookup.
    ///
    /// `mode` is the effective [`AcceptMode`], `hit_count` the number of
    /// records returned and `failed_fields` how many field units could not
    /// fetch candidates.
    fn record_lookup(
        &self,
        kind: LookupKind,
        mode: AcceptMode,
        latency: Duration,
        hit_count: usize,
        failed_fields: usize,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global lookup metrics recorder.
///
/// Usually called once at startup so every matcher shares one backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
