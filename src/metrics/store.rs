//! The six autoscaler gauge families.
//!
//! Family and label names match the historical exporter output so existing
//! dashboards and alerts keep working.

use prometheus::Registry;

use crate::metrics::error::MetricsError;
use crate::metrics::registry::GaugeFamily;

pub const LABEL_HPA_NAME: &str = "hpa_name";
pub const LABEL_NAMESPACE: &str = "namespace";
pub const LABEL_TARGET_REF: &str = "targetRef";
pub const LABEL_TARGET_REF_KIND: &str = "targetRefKind";
pub const LABEL_METRIC: &str = "metric";
pub const LABEL_TYPE: &str = "type";

const SCALAR_LABELS: [&str; 4] = [
    LABEL_HPA_NAME,
    LABEL_NAMESPACE,
    LABEL_TARGET_REF,
    LABEL_TARGET_REF_KIND,
];

const METRIC_LABELS: [&str; 6] = [
    LABEL_HPA_NAME,
    LABEL_NAMESPACE,
    LABEL_TARGET_REF,
    LABEL_TARGET_REF_KIND,
    LABEL_METRIC,
    LABEL_TYPE,
];

/// Gauges for the autoscaler spec and status.
#[derive(Clone)]
pub struct HpaMetrics {
    pub status_current_replicas: GaugeFamily<4>,
    pub status_desired_replicas: GaugeFamily<4>,
    pub spec_max_replicas: GaugeFamily<4>,
    pub spec_min_replicas: GaugeFamily<4>,
    pub status_current_metrics: GaugeFamily<6>,
    pub spec_target_metrics: GaugeFamily<6>,
}

impl HpaMetrics {
    pub fn new(prefix: &str) -> Result<Self, MetricsError> {
        let scalar = |name: &str, help: &str| {
            GaugeFamily::new(&format!("{prefix}{name}"), help, SCALAR_LABELS)
        };
        let metric = |name: &str, help: &str| {
            GaugeFamily::new(&format!("{prefix}{name}"), help, METRIC_LABELS)
        };

        Ok(Self {
            status_current_replicas: scalar(
                "hpa_status_current_replicas",
                "Current number of replicas managed by the autoscaler.",
            )?,
            status_desired_replicas: scalar(
                "hpa_status_desired_replicas",
                "Desired number of replicas computed by the autoscaler.",
            )?,
            spec_max_replicas: scalar(
                "hpa_spec_max_replicas",
                "Upper replica bound of the autoscaler.",
            )?,
            spec_min_replicas: scalar(
                "hpa_spec_min_replicas",
                "Lower replica bound of the autoscaler.",
            )?,
            status_current_metrics: metric(
                "hpa_status_current_metrics",
                "Last observed value of each autoscaler metric.",
            )?,
            spec_target_metrics: metric(
                "hpa_spec_targets_metrics",
                "Target value of each autoscaler metric.",
            )?,
        })
    }

    /// Remove every series for an autoscaler, whatever its scale target.
    pub fn delete_autoscaler(&self, name: &str, namespace: &str) -> usize {
        let subset = [(LABEL_HPA_NAME, name), (LABEL_NAMESPACE, namespace)];
        self.status_current_replicas.delete_partial_match(&subset)
            + self.status_desired_replicas.delete_partial_match(&subset)
            + self.spec_max_replicas.delete_partial_match(&subset)
            + self.spec_min_replicas.delete_partial_match(&subset)
            + self.status_current_metrics.delete_partial_match(&subset)
            + self.spec_target_metrics.delete_partial_match(&subset)
    }

    /// Live series for an autoscaler across all six families. Test inspection only.
    #[doc(hidden)]
    pub fn autoscaler_series(&self, name: &str, namespace: &str) -> usize {
        let subset = [(LABEL_HPA_NAME, name), (LABEL_NAMESPACE, namespace)];
        self.status_current_replicas.count_matching(&subset)
            + self.status_desired_replicas.count_matching(&subset)
            + self.spec_max_replicas.count_matching(&subset)
            + self.spec_min_replicas.count_matching(&subset)
            + self.status_current_metrics.count_matching(&subset)
            + self.spec_target_metrics.count_matching(&subset)
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<(), MetricsError> {
        self.status_current_replicas.register(registry)?;
        self.status_desired_replicas.register(registry)?;
        self.spec_max_replicas.register(registry)?;
        self.spec_min_replicas.register(registry)?;
        self.status_current_metrics.register(registry)?;
        self.spec_target_metrics.register(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_autoscaler_spans_all_families() {
        let metrics = HpaMetrics::new("").unwrap();
        let scalar = ["web", "default", "web-deploy", "Deployment"];
        let per_metric = ["web", "default", "web-deploy", "Deployment", "qps", "Pods"];

        metrics.status_current_replicas.set(scalar, 1.0);
        metrics.status_desired_replicas.set(scalar, 1.0);
        metrics.spec_max_replicas.set(scalar, 1.0);
        metrics.spec_min_replicas.set(scalar, 1.0);
        metrics.status_current_metrics.set(per_metric, 1.0);
        metrics.spec_target_metrics.set(per_metric, 1.0);
        metrics
            .spec_max_replicas
            .set(["web", "staging", "web-deploy", "Deployment"], 1.0);

        assert_eq!(metrics.autoscaler_series("web", "default"), 6);
        assert_eq!(metrics.delete_autoscaler("web", "default"), 6);
        assert_eq!(metrics.autoscaler_series("web", "default"), 0);
        assert_eq!(metrics.autoscaler_series("web", "staging"), 1);
    }
}
