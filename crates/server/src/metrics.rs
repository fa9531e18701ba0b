//! Prometheus export of lookup metrics.
//!
//! [`install`] sets up the global `metrics` recorder and registers a
//! [`PrometheusMatchMetrics`] observer with the matcher, so every lookup
//! served by this process shows up on `/metrics`.

use std::sync::Arc;
use std::time::Duration;

use bookstore::{set_match_metrics, AcceptMode, LookupKind, MatchMetrics};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Forwards lookup outcomes to the `metrics` facade.
pub struct PrometheusMatchMetrics;

fn mode_label(mode: AcceptMode) -> &'static str {
    match mode {
        AcceptMode::All => "all",
        AcceptMode::Any => "any",
    }
}

impl MatchMetrics for PrometheusMatchMetrics {
    fn record_lookup(
        &self,
        kind: LookupKind,
        mode: AcceptMode,
        latency: Duration,
        hit_count: usize,
        failed_fields: usize,
    ) {
        let kind = kind.as_str();
        metrics::counter!("bookstore_lookups_total", "kind" => kind, "mode" => mode_label(mode))
            .increment(1);
        metrics::histogram!("bookstore_lookup_duration_seconds", "kind" => kind)
            .record(latency.as_secs_f64());
        metrics::counter!("bookstore_lookup_hits_total", "kind" => kind)
            .increment(hit_count as u64);
        if hit_count == 0 {
            metrics::counter!("bookstore_lookup_misses_total", "kind" => kind).increment(1);
        }
        if failed_fields > 0 {
            metrics::counter!("bookstore_lookup_failed_fields_total", "kind" => kind)
                .increment(failed_fields as u64);
        }
    }
}

/// Install the process-wide Prometheus recorder and hook the matcher into it.
pub fn install() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    set_match_metrics(Some(Arc::new(PrometheusMatchMetrics)));
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_renders_lookup_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            PrometheusMatchMetrics.record_lookup(
                LookupKind::Books,
                AcceptMode::All,
                Duration::from_millis(3),
                0,
                1,
            );
        });

        let rendered = handle.render();
        assert!(rendered.contains("bookstore_lookups_total"));
        assert!(rendered.contains("mode=\"all\""));
        assert!(rendered.contains("bookstore_lookup_misses_total{kind=\"books\"} 1"));
        assert!(rendered.contains("bookstore_lookup_failed_fields_total{kind=\"books\"} 1"));
    }
}
