//! Projection of autoscaler snapshots onto gauge series.
//!
//! # Actions
//! - Apply: set the four replica gauges, then every decodable entry of the
//!   two legacy metric annotations
//! - Retract: drop every series labelled with the autoscaler's name and
//!   namespace, across all six families
//!
//! Retraction deliberately matches on `{hpa_name, namespace}` only, so series
//! recorded under a previous scale target are removed as well.

use std::sync::Arc;

use crate::hpa::legacy::{self, MetricDirection};
use crate::hpa::snapshot::AutoscalerSnapshot;
use crate::metrics::registry::GaugeFamily;
use crate::metrics::MetricsRegistry;

/// What to do with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Apply,
    Retract,
}

/// Writes snapshots into the metrics registry.
#[derive(Clone)]
pub struct Projector {
    metrics: Arc<MetricsRegistry>,
}

impl Projector {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    pub fn project(&self, snapshot: &AutoscalerSnapshot, action: Action) {
        match action {
            Action::Apply => self.apply(snapshot),
            Action::Retract => self.retract(snapshot),
        }
    }

    pub fn apply(&self, snapshot: &AutoscalerSnapshot) {
        let hpa = self.metrics.hpa();
        let labels = snapshot.scalar_labels();

        hpa.status_current_replicas
            .set(labels, f64::from(snapshot.current_replicas));
        hpa.status_desired_replicas
            .set(labels, f64::from(snapshot.desired_replicas));
        hpa.spec_max_replicas
            .set(labels, f64::from(snapshot.max_replicas));
        hpa.spec_min_replicas
            .set(labels, f64::from(snapshot.min_replicas));

        self.apply_legacy(
            snapshot,
            MetricDirection::Current,
            snapshot.current_metrics_annotation(),
            &hpa.status_current_metrics,
        );
        self.apply_legacy(
            snapshot,
            MetricDirection::Target,
            snapshot.target_metrics_annotation(),
            &hpa.spec_target_metrics,
        );
    }

    pub fn retract(&self, snapshot: &AutoscalerSnapshot) {
        let removed = self
            .metrics
            .hpa()
            .delete_autoscaler(&snapshot.name, &snapshot.namespace);
        tracing::trace!(
            hpa = %snapshot.name,
            namespace = %snapshot.namespace,
            removed,
            "Retracted autoscaler series"
        );
    }

    fn apply_legacy(
        &self,
        snapshot: &AutoscalerSnapshot,
        direction: MetricDirection,
        raw: Option<&str>,
        family: &GaugeFamily<6>,
    ) {
        let Some(raw) = raw else {
            return;
        };

        let entries = match legacy::decode(direction, raw) {
            Ok(entries) => entries,
            Err(e) => {
                self.metrics
                    .exporter()
                    .annotation_decode_errors_total
                    .with_label_values(&[direction.as_str()])
                    .inc();
                tracing::debug!(
                    hpa = %snapshot.name,
                    namespace = %snapshot.namespace,
                    annotation = direction.annotation_key(),
                    value = raw,
                    error = %e,
                    "Ignoring undecodable metrics annotation"
                );
                return;
            }
        };

        let [name, namespace, target_ref, target_ref_kind] = snapshot.scalar_labels();
        for entry in entries {
            match entry {
                Ok(metric) => family.set(
                    [
                        name,
                        namespace,
                        target_ref,
                        target_ref_kind,
                        &metric.name,
                        metric.kind.as_str(),
                    ],
                    metric.value(),
                ),
                Err(skipped) => {
                    self.metrics
                        .exporter()
                        .skipped_metric_entries_total
                        .with_label_values(&[direction.as_str(), skipped.reason()])
                        .inc();
                    tracing::debug!(
                        hpa = %snapshot.name,
                        namespace = %snapshot.namespace,
                        annotation = direction.annotation_key(),
                        reason = %skipped,
                        "Skipping metric entry"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpa::snapshot::{CURRENT_METRICS_ANNOTATION, TARGET_METRICS_ANNOTATION};

    fn snapshot() -> AutoscalerSnapshot {
        AutoscalerSnapshot {
            name: "web".into(),
            namespace: "default".into(),
            target_ref_name: "web-deploy".into(),
            target_ref_kind: "Deployment".into(),
            min_replicas: 2,
            max_replicas: 10,
            current_replicas: 3,
            desired_replicas: 4,
            ..AutoscalerSnapshot::default()
        }
    }

    fn projector() -> (Projector, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new("kube_").unwrap());
        (Projector::new(metrics.clone()), metrics)
    }

    #[test]
    fn test_apply_sets_scalar_families() {
        let (projector, metrics) = projector();
        projector.project(&snapshot(), Action::Apply);

        let labels = ["web", "default", "web-deploy", "Deployment"];
        let hpa = metrics.hpa();
        assert_eq!(hpa.status_current_replicas.get(labels), Some(3.0));
        assert_eq!(hpa.status_desired_replicas.get(labels), Some(4.0));
        assert_eq!(hpa.spec_max_replicas.get(labels), Some(10.0));
        assert_eq!(hpa.spec_min_replicas.get(labels), Some(2.0));
        assert_eq!(hpa.status_current_metrics.series_count(), 0);
        assert_eq!(hpa.spec_target_metrics.series_count(), 0);
    }

    #[test]
    fn test_apply_sets_legacy_metric_families() {
        let (projector, metrics) = projector();
        let mut snap = snapshot();
        snap.annotations.insert(
            CURRENT_METRICS_ANNOTATION.into(),
            r#"[{"type":"Pods","pods":{"metricName":"qps","currentAverageValue":"1234m"}}]"#.into(),
        );
        snap.annotations.insert(
            TARGET_METRICS_ANNOTATION.into(),
            r#"[{"type":"Pods","pods":{"metricName":"qps","targetAverageValue":"2"}}]"#.into(),
        );

        projector.apply(&snap);

        let labels = ["web", "default", "web-deploy", "Deployment", "qps", "Pods"];
        assert_eq!(metrics.hpa().status_current_metrics.get(labels), Some(1.234));
        assert_eq!(metrics.hpa().spec_target_metrics.get(labels), Some(2.0));
    }

    #[test]
    fn test_undecodable_annotation_is_counted_and_ignored() {
        let (projector, metrics) = projector();
        let mut snap = snapshot();
        snap.annotations
            .insert(CURRENT_METRICS_ANNOTATION.into(), "not-json".into());

        projector.apply(&snap);

        assert_eq!(metrics.hpa().status_current_metrics.series_count(), 0);
        assert_eq!(metrics.hpa().spec_max_replicas.series_count(), 1);
        assert_eq!(
            metrics
                .exporter()
                .annotation_decode_errors_total
                .with_label_values(&["current"])
                .get(),
            1
        );
    }

    #[test]
    fn test_retract_removes_all_series() {
        let (projector, metrics) = projector();
        let mut snap = snapshot();
        snap.annotations.insert(
            TARGET_METRICS_ANNOTATION.into(),
            r#"[{"type":"External","external":{"metricName":"lag","targetAverageValue":"30"}}]"#.into(),
        );
        projector.apply(&snap);
        assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 5);

        projector.project(&snap, Action::Retract);
        assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 0);
    }
}
