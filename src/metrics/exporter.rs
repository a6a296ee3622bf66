//! Self-metrics describing the exporter itself.

use prometheus::{GaugeVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::metrics::error::MetricsError;

/// Counters and info gauges about the exporter's own operation.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub build_info: GaugeVec,
    /// Labels: event = "add" | "update" | "delete"
    pub watch_events_total: IntCounterVec,
    pub watch_errors_total: IntCounter,
    /// Labels: annotation = "current" | "target"
    pub annotation_decode_errors_total: IntCounterVec,
    /// Labels: annotation, reason = "unknown_type" | "missing_field" | "invalid_quantity"
    pub skipped_metric_entries_total: IntCounterVec,
}

impl ExporterMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let build_info = GaugeVec::new(
            Opts::new(
                "hpa_exporter_build_info",
                "Build information of the running exporter, value is always 1.",
            ),
            &["version"],
        )
        .map_err(registration("hpa_exporter_build_info"))?;
        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1.0);

        let watch_events_total = IntCounterVec::new(
            Opts::new(
                "hpa_exporter_watch_events_total",
                "Autoscaler events processed, by event type.",
            ),
            &["event"],
        )
        .map_err(registration("hpa_exporter_watch_events_total"))?;

        let watch_errors_total = IntCounter::with_opts(Opts::new(
            "hpa_exporter_watch_errors_total",
            "Errors reported by the autoscaler watch stream.",
        ))
        .map_err(registration("hpa_exporter_watch_errors_total"))?;

        let annotation_decode_errors_total = IntCounterVec::new(
            Opts::new(
                "hpa_exporter_annotation_decode_errors_total",
                "Legacy metric annotations that were not a valid JSON array.",
            ),
            &["annotation"],
        )
        .map_err(registration("hpa_exporter_annotation_decode_errors_total"))?;

        let skipped_metric_entries_total = IntCounterVec::new(
            Opts::new(
                "hpa_exporter_skipped_metric_entries_total",
                "Legacy metric annotation entries that were not exported.",
            ),
            &["annotation", "reason"],
        )
        .map_err(registration("hpa_exporter_skipped_metric_entries_total"))?;

        Ok(Self {
            build_info,
            watch_events_total,
            watch_errors_total,
            annotation_decode_errors_total,
            skipped_metric_entries_total,
        })
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<(), MetricsError> {
        registry
            .register(Box::new(self.build_info.clone()))
            .map_err(registration("hpa_exporter_build_info"))?;
        registry
            .register(Box::new(self.watch_events_total.clone()))
            .map_err(registration("hpa_exporter_watch_events_total"))?;
        registry
            .register(Box::new(self.watch_errors_total.clone()))
            .map_err(registration("hpa_exporter_watch_errors_total"))?;
        registry
            .register(Box::new(self.annotation_decode_errors_total.clone()))
            .map_err(registration("hpa_exporter_annotation_decode_errors_total"))?;
        registry
            .register(Box::new(self.skipped_metric_entries_total.clone()))
            .map_err(registration("hpa_exporter_skipped_metric_entries_total"))
    }
}

fn registration(name: &'static str) -> impl Fn(prometheus::Error) -> MetricsError {
    move |source| MetricsError::Registration {
        name: name.to_string(),
        source,
    }
}
