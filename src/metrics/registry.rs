//! Injected Prometheus registry and gauge families.
//!
//! Each [`MetricsRegistry`] owns its own `prometheus::Registry`, so several
//! watchers (or tests) can run side by side without sharing state.

use std::collections::HashMap;

use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::metrics::error::MetricsError;
use crate::metrics::exporter::ExporterMetrics;
use crate::metrics::store::HpaMetrics;

/// A gauge family whose label arity is fixed at compile time.
///
/// Holds the latest value per label combination. `get`, `series_count` and
/// `count_matching` are read-side inspection helpers for tests; scrapes go
/// through [`MetricsRegistry::render`].
#[derive(Clone)]
pub struct GaugeFamily<const N: usize> {
    vec: GaugeVec,
    label_names: [&'static str; N],
}

impl<const N: usize> GaugeFamily<N> {
    pub fn new(name: &str, help: &str, label_names: [&'static str; N]) -> Result<Self, MetricsError> {
        let vec = GaugeVec::new(Opts::new(name, help), &label_names).map_err(|source| {
            MetricsError::Registration {
                name: name.to_string(),
                source,
            }
        })?;
        Ok(Self { vec, label_names })
    }

    /// Upsert the value for one label combination.
    pub fn set(&self, labels: [&str; N], value: f64) {
        self.vec.with_label_values(&labels).set(value);
    }

    /// Remove every series whose labels agree with `subset` on the subset's keys.
    ///
    /// Returns how many series were removed.
    pub fn delete_partial_match(&self, subset: &[(&str, &str)]) -> usize {
        let mut removed = 0;
        for family in self.vec.collect() {
            for metric in family.get_metric() {
                let labels: HashMap<&str, &str> = metric
                    .get_label()
                    .iter()
                    .map(|pair| (pair.get_name(), pair.get_value()))
                    .collect();

                let matches = subset
                    .iter()
                    .all(|(name, value)| labels.get(name) == Some(value));
                if matches && self.vec.remove(&labels).is_ok() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Current value for an exact label combination, without creating it.
    #[doc(hidden)]
    pub fn get(&self, labels: [&str; N]) -> Option<f64> {
        let wanted: HashMap<&str, &str> = self.label_names.iter().copied().zip(labels).collect();
        self.vec.collect().iter().find_map(|family| {
            family.get_metric().iter().find_map(|metric| {
                let matches = metric.get_label().len() == N
                    && metric
                        .get_label()
                        .iter()
                        .all(|pair| wanted.get(pair.get_name()) == Some(&pair.get_value()));
                matches.then(|| metric.get_gauge().get_value())
            })
        })
    }

    /// Number of live series in the family.
    #[doc(hidden)]
    pub fn series_count(&self) -> usize {
        self.vec
            .collect()
            .iter()
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Number of live series matching `subset`.
    #[doc(hidden)]
    pub fn count_matching(&self, subset: &[(&str, &str)]) -> usize {
        self.vec
            .collect()
            .iter()
            .flat_map(|family| family.get_metric().iter())
            .filter(|metric| {
                subset.iter().all(|(name, value)| {
                    metric
                        .get_label()
                        .iter()
                        .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
                })
            })
            .count()
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<(), MetricsError> {
        registry
            .register(Box::new(self.vec.clone()))
            .map_err(|source| MetricsError::Registration {
                name: self.name(),
                source,
            })
    }

    fn name(&self) -> String {
        self.vec
            .desc()
            .first()
            .map(|desc| desc.fq_name.clone())
            .unwrap_or_default()
    }
}

/// Everything the exporter publishes, backed by one Prometheus registry.
pub struct MetricsRegistry {
    registry: Registry,
    hpa: HpaMetrics,
    exporter: ExporterMetrics,
}

impl MetricsRegistry {
    /// Create a registry with the autoscaler families under `prefix`.
    pub fn new(prefix: &str) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let hpa = HpaMetrics::new(prefix)?;
        hpa.register(&registry)?;

        let exporter = ExporterMetrics::new()?;
        exporter.register(&registry)?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|source| MetricsError::Registration {
                name: "process".to_string(),
                source,
            })?;

        Ok(Self {
            registry,
            hpa,
            exporter,
        })
    }

    pub fn hpa(&self) -> &HpaMetrics {
        &self.hpa
    }

    pub fn exporter(&self) -> &ExporterMetrics {
        &self.exporter
    }

    /// Render all families in the text exposition format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .map_err(MetricsError::Encode)?;
        // The text encoder only ever writes UTF-8.
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> GaugeFamily<3> {
        GaugeFamily::new("test_gauge", "test gauge", ["a", "b", "c"]).unwrap()
    }

    #[test]
    fn test_set_is_last_write_wins() {
        let gauge = family();
        gauge.set(["1", "2", "3"], 1.0);
        gauge.set(["1", "2", "3"], 5.0);
        assert_eq!(gauge.get(["1", "2", "3"]), Some(5.0));
        assert_eq!(gauge.series_count(), 1);
        assert_eq!(gauge.get(["1", "2", "x"]), None);
        // `get` never creates series.
        assert_eq!(gauge.series_count(), 1);
    }

    #[test]
    fn test_delete_partial_match_ignores_other_keys() {
        let gauge = family();
        gauge.set(["web", "default", "x"], 1.0);
        gauge.set(["web", "default", "y"], 2.0);
        gauge.set(["web", "other", "x"], 3.0);
        gauge.set(["api", "default", "x"], 4.0);

        let removed = gauge.delete_partial_match(&[("a", "web"), ("b", "default")]);
        assert_eq!(removed, 2);
        assert_eq!(gauge.series_count(), 2);
        assert_eq!(gauge.get(["web", "other", "x"]), Some(3.0));
        assert_eq!(gauge.get(["api", "default", "x"]), Some(4.0));
    }

    #[test]
    fn test_delete_partial_match_without_matches_is_noop() {
        let gauge = family();
        gauge.set(["web", "default", "x"], 1.0);
        assert_eq!(gauge.delete_partial_match(&[("a", "nope")]), 0);
        assert_eq!(gauge.series_count(), 1);
    }

    #[test]
    fn test_count_matching() {
        let gauge = family();
        gauge.set(["web", "default", "x"], 1.0);
        gauge.set(["web", "default", "y"], 1.0);
        gauge.set(["api", "default", "y"], 1.0);
        assert_eq!(gauge.count_matching(&[("a", "web")]), 2);
        assert_eq!(gauge.count_matching(&[("c", "y")]), 2);
        assert_eq!(gauge.count_matching(&[]), 3);
    }

    #[test]
    fn test_registries_are_isolated() {
        let first = MetricsRegistry::new("kube_").unwrap();
        let second = MetricsRegistry::new("kube_").unwrap();
        first
            .hpa()
            .spec_max_replicas
            .set(["web", "default", "web-deploy", "Deployment"], 10.0);

        assert!(first.render().unwrap().contains("kube_hpa_spec_max_replicas{"));
        assert!(!second.render().unwrap().contains("kube_hpa_spec_max_replicas{"));
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        assert!(matches!(
            MetricsRegistry::new("bad-prefix-"),
            Err(MetricsError::Registration { .. })
        ));
    }
}
