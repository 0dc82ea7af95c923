// src/metrics/collector.rs
use crate::health::Status;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Aggregation passes
    pub aggregations_total: IntCounterVec,
    pub aggregation_duration_seconds: Histogram,
    pub notes_dropped_total: IntCounter,

    // Individual checks
    pub check_results_total: IntCounterVec,
    pub check_panics_total: IntCounterVec,
    pub checks_registered: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let aggregations_total = IntCounterVec::new(
            Opts::new("healthz_aggregations_total", "Aggregation passes by overall status"),
            &["status"],
        )?;
        registry.register(Box::new(aggregations_total.clone()))?;

        let aggregation_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "healthz_aggregation_duration_seconds",
            "Duration of one aggregation pass in seconds",
        ))?;
        registry.register(Box::new(aggregation_duration_seconds.clone()))?;

        let notes_dropped_total = IntCounter::new(
            "healthz_notes_dropped_total",
            "Notes discarded because the report exceeded its note limit",
        )?;
        registry.register(Box::new(notes_dropped_total.clone()))?;

        let check_results_total = IntCounterVec::new(
            Opts::new("healthz_check_results_total", "Check results by check and status"),
            &["check", "status"],
        )?;
        registry.register(Box::new(check_results_total.clone()))?;

        let check_panics_total = IntCounterVec::new(
            Opts::new("healthz_check_panics_total", "Panics recovered from checks"),
            &["check"],
        )?;
        registry.register(Box::new(check_panics_total.clone()))?;

        let checks_registered =
            IntGauge::new("healthz_checks_registered", "Number of registered checks")?;
        registry.register(Box::new(checks_registered.clone()))?;

        Ok(Self {
            aggregations_total,
            aggregation_duration_seconds,
            notes_dropped_total,
            check_results_total,
            check_panics_total,
            checks_registered,
        })
    }

    pub fn record_aggregation(&self, status: Status, duration: Duration) {
        self.aggregations_total
            .with_label_values(&[status.as_str()])
            .inc();
        self.aggregation_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn record_check(&self, check: &str, status: Status) {
        self.check_results_total
            .with_label_values(&[check, status.as_str()])
            .inc();
    }

    pub fn record_panic(&self, check: &str) {
        self.check_panics_total.with_label_values(&[check]).inc();
    }

    pub fn record_notes_dropped(&self, dropped: usize) {
        self.notes_dropped_total.inc_by(dropped as u64);
    }

    pub fn set_registered_checks(&self, count: usize) {
        self.checks_registered.set(count as i64);
    }
}
