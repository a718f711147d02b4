//! Refresh metrics.
//!
//! Recording is always safe; without an installed recorder the macros are
//! no-ops. The Prometheus exporter is only started when `PROMETHEUS_ADDR` is set.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

pub const PROMETHEUS_ADDR_ENV: &str = "PROMETHEUS_ADDR";

static INIT: Once = Once::new();

/// Install the Prometheus exporter if `PROMETHEUS_ADDR` names a socket address.
///
/// Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| {
        let Ok(addr_str) = std::env::var(PROMETHEUS_ADDR_ENV) else {
            return;
        };
        let addr: SocketAddr = match addr_str.parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("Invalid {} '{}': {}", PROMETHEUS_ADDR_ENV, addr_str, e);
                return;
            }
        };

        match metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            Ok(()) => {
                RefreshMetrics::describe();
                info!("Prometheus exporter listening on http://{}/metrics", addr);
            }
            Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
        }
    });
}

/// Metrics for refresh runs
pub struct RefreshMetrics;

impl RefreshMetrics {
    fn describe() {
        describe_counter!("showings_refresh_runs_total", "Refresh runs by outcome");
        describe_counter!("showings_titles_fetched_total", "Raw titles fetched per source");
        describe_counter!("showings_source_failures_total", "Source fetches that failed");
        describe_counter!("showings_movies_upserted_total", "Movies written to storage");
        describe_counter!("showings_stored_total", "Showings written to storage");
        describe_counter!("showings_skipped_total", "Showings rejected during aggregation");
        describe_histogram!("showings_match_duration_seconds", "Time spent matching titles");
        describe_histogram!("showings_refresh_duration_seconds", "Wall time of a refresh run");
    }

    pub fn record_titles_fetched(source: &'static str, count: usize) {
        counter!("showings_titles_fetched_total", "source" => source).increment(count as u64);
    }

    pub fn record_source_failure(source: &'static str, stage: &'static str) {
        counter!("showings_source_failures_total", "source" => source, "stage" => stage)
            .increment(1);
    }

    pub fn record_match_duration(duration_secs: f64) {
        histogram!("showings_match_duration_seconds").record(duration_secs);
    }

    pub fn record_movies_upserted(count: usize) {
        counter!("showings_movies_upserted_total").increment(count as u64);
    }

    pub fn record_showings(source: &'static str, stored: usize, skipped: usize) {
        counter!("showings_stored_total", "source" => source).increment(stored as u64);
        counter!("showings_skipped_total", "source" => source).increment(skipped as u64);
    }

    pub fn record_run(outcome: &'static str, duration_secs: f64) {
        counter!("showings_refresh_runs_total", "outcome" => outcome).increment(1);
        histogram!("showings_refresh_duration_seconds").record(duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_a_no_op() {
        init_metrics();
        init_metrics();
        RefreshMetrics::record_titles_fetched("grand", 3);
        RefreshMetrics::record_source_failure("taj", "titles");
        RefreshMetrics::record_match_duration(0.01);
        RefreshMetrics::record_movies_upserted(2);
        RefreshMetrics::record_showings("prime", 4, 1);
        RefreshMetrics::record_run("completed", 0.2);
    }
}
