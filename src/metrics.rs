//! Prometheus metrics for detection passes.
//!
//! Counters track how many markets a pass looked at, how many it skipped
//! (labelled by skip reason) and how many surebets it reported. A histogram
//! records the duration of each pass. Without an installed recorder every
//! call is a no-op.

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

/// Duration of one full detection pass.
pub const METRIC_SCAN_DURATION: &str = "surebet_scan_duration_ms";
/// Markets run through the per-market check.
pub const METRIC_MARKETS_EVALUATED: &str = "surebet_markets_evaluated_total";
/// Markets that produced no opportunity, by `reason`.
pub const METRIC_MARKETS_SKIPPED: &str = "surebet_markets_skipped_total";
/// Opportunities reported.
pub const METRIC_OPPORTUNITIES: &str = "surebet_opportunities_total";

/// Register descriptions for every surebet metric with the active recorder.
pub fn describe_all() {
    describe_histogram!(
        METRIC_SCAN_DURATION,
        Unit::Milliseconds,
        "Wall time of one detection pass over consolidated events"
    );
    describe_counter!(METRIC_MARKETS_EVALUATED, "Markets checked for a surebet");
    describe_counter!(
        METRIC_MARKETS_SKIPPED,
        "Markets without a reportable surebet, by skip reason"
    );
    describe_counter!(METRIC_OPPORTUNITIES, "Surebets reported");

    debug!("Surebet metrics described");
}

/// Install a global Prometheus recorder and describe all metrics.
///
/// The returned handle renders the text exposition format on demand.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_all();
    Ok(handle)
}

pub fn inc_markets_evaluated() {
    counter!(METRIC_MARKETS_EVALUATED).increment(1);
}

pub fn inc_markets_skipped(reason: &'static str) {
    counter!(METRIC_MARKETS_SKIPPED, "reason" => reason).increment(1);
}

pub fn inc_opportunities() {
    counter!(METRIC_OPPORTUNITIES).increment(1);
}

/// Records the scan duration histogram when dropped.
pub struct ScanTimer {
    started: Instant,
}

impl ScanTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for ScanTimer {
    fn drop(&mut self) {
        let ms = self.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_SCAN_DURATION).record(ms);
    }
}
