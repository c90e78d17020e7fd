//! Prometheus metrics for the server update-status subsystem.
//!
//! All metrics follow the naming convention: `tc_updates_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: status changes, queue actions, commit retries, errors
//! - **Histogram**: propagation fan-out and duration

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // STATUS TRANSITIONS
    // =========================================================================

    /// Server status changes by target status
    pub static ref STATUS_CHANGES: CounterVec = CounterVec::new(
        Opts::new("tc_updates_status_changes_total", "Server status changes"),
        &["status"]  // status: ONLINE/OFFLINE/REPORTED/ADMIN_DOWN/PRE_PROD
    ).expect("metric creation failed");

    // =========================================================================
    // QUEUEING
    // =========================================================================

    /// Queue/dequeue requests by scope
    pub static ref QUEUE_ACTIONS: CounterVec = CounterVec::new(
        Opts::new("tc_updates_queue_actions_total", "Queue and dequeue requests"),
        &["scope", "action"]  // scope: server/cachegroup/topology/reval, action: queue/dequeue
    ).expect("metric creation failed");

    /// Apply-time reports received from caches
    pub static ref APPLY_REPORTS: CounterVec = CounterVec::new(
        Opts::new("tc_updates_apply_reports_total", "Update/revalidation apply reports"),
        &["kind"]  // kind: config/reval/failure
    ).expect("metric creation failed");

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    /// Servers queued per propagation run
    pub static ref PROPAGATION_FANOUT: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "tc_updates_propagation_fanout_servers",
            "Number of descendant servers queued by one propagation"
        ).buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0])
    ).expect("metric creation failed");

    /// Time spent planning and committing one change set
    pub static ref COMMIT_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "tc_updates_commit_duration_seconds",
            "Time spent planning and committing a change set"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"]
    ).expect("metric creation failed");

    /// Optimistic commit retries after a revision conflict
    pub static ref COMMIT_RETRIES: Counter = Counter::new(
        "tc_updates_commit_retries_total",
        "Change sets replanned after a conflicting concurrent commit"
    ).expect("metric creation failed");

    // =========================================================================
    // ERRORS
    // =========================================================================

    /// Failed operations by error kind
    pub static ref UPDATE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("tc_updates_errors_total", "Failed operations by error kind"),
        &["kind"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(STATUS_CHANGES.clone()),
        Box::new(QUEUE_ACTIONS.clone()),
        Box::new(APPLY_REPORTS.clone()),
        Box::new(PROPAGATION_FANOUT.clone()),
        Box::new(COMMIT_DURATION.clone()),
        Box::new(COMMIT_RETRIES.clone()),
        Box::new(UPDATE_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all registered metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }

    /// Start a timer for one labelled series of [`COMMIT_DURATION`].
    pub fn commit(operation: &str) -> Self {
        Self::new(&COMMIT_DURATION.with_label_values(&[operation]))
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}
