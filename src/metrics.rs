//! Prometheus-compatible metrics for the Samarth Q&A service.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize the global metrics instance.
pub fn get_metrics() -> Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new())).clone()
}

/// Default histogram buckets for latency tracking (in seconds).
fn default_latency_buckets() -> Vec<f64> {
    vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
}

/// All metrics for the Samarth server.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    // Counters
    /// Total number of questions received.
    pub questions_total: IntCounter,
    /// Questions that matched no intent template.
    pub questions_unknown_total: IntCounter,
    /// Questions rejected with a domain error (unknown entity, no data).
    pub question_domain_errors_total: IntCounter,
    /// Total number of dataset refreshes.
    pub refresh_total: IntCounter,

    // Gauges
    /// Production records in the current snapshot.
    pub production_records: IntGauge,
    /// Rainfall records in the current snapshot.
    pub rainfall_records: IntGauge,
    /// Uptime in seconds.
    pub uptime_seconds: IntGauge,

    // Histograms (durations in seconds)
    /// End-to-end question handling duration.
    pub ask_duration_seconds: Histogram,
    /// Question parsing duration.
    pub parse_duration_seconds: Histogram,

    /// Server start time.
    start_time: RwLock<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let questions_total = IntCounter::new(
            "samarth_questions_total",
            "Total number of questions received",
        )
        .expect("failed to create counter");

        let questions_unknown_total = IntCounter::new(
            "samarth_questions_unknown_total",
            "Questions that matched no intent template",
        )
        .expect("failed to create counter");

        let question_domain_errors_total = IntCounter::new(
            "samarth_question_domain_errors_total",
            "Questions rejected with a domain error",
        )
        .expect("failed to create counter");

        let refresh_total = IntCounter::new(
            "samarth_refresh_total",
            "Total number of dataset refreshes",
        )
        .expect("failed to create counter");

        let production_records = IntGauge::new(
            "samarth_production_records",
            "Production records in the current snapshot",
        )
        .expect("failed to create gauge");

        let rainfall_records = IntGauge::new(
            "samarth_rainfall_records",
            "Rainfall records in the current snapshot",
        )
        .expect("failed to create gauge");

        let uptime_seconds =
            IntGauge::new("samarth_uptime_seconds", "Uptime in seconds").expect("failed to create gauge");

        let ask_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "samarth_ask_duration_seconds",
                "End-to-end question handling duration",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        let parse_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "samarth_parse_duration_seconds",
                "Question parsing duration",
            )
            .buckets(default_latency_buckets()),
        )
        .expect("failed to create histogram");

        for collector in [
            Box::new(questions_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(questions_unknown_total.clone()),
            Box::new(question_domain_errors_total.clone()),
            Box::new(refresh_total.clone()),
            Box::new(production_records.clone()),
            Box::new(rainfall_records.clone()),
            Box::new(uptime_seconds.clone()),
            Box::new(ask_duration_seconds.clone()),
            Box::new(parse_duration_seconds.clone()),
        ] {
            registry
                .register(collector)
                .expect("failed to register metric");
        }

        Self {
            registry,
            questions_total,
            questions_unknown_total,
            question_domain_errors_total,
            refresh_total,
            production_records,
            rainfall_records,
            uptime_seconds,
            ask_duration_seconds,
            parse_duration_seconds,
            start_time: RwLock::new(Instant::now()),
        }
    }

    /// Update the uptime gauge.
    pub fn update_uptime(&self) {
        let uptime = self.start_time.read().elapsed();
        self.uptime_seconds.set(uptime.as_secs() as i64);
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;
        self.update_uptime();

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Start a timer that records duration to a histogram when dropped.
    pub fn start_timer(histogram: &Histogram) -> HistogramTimer {
        HistogramTimer {
            histogram: histogram.clone(),
            start: Instant::now(),
        }
    }
}

/// Timer that records duration to a histogram when dropped.
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}

impl HistogramTimer {
    /// Get the elapsed time without stopping the timer.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
