//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use hpa_exporter::hpa::AutoscalerSnapshot;
use hpa_exporter::MetricsRegistry;
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use serde_json::json;

pub const CURRENT_METRICS: &str = "autoscaling.alpha.kubernetes.io/current-metrics";
pub const TARGET_METRICS: &str = "autoscaling.alpha.kubernetes.io/metrics";

/// Fresh registry with the default prefix.
pub fn registry() -> Arc<MetricsRegistry> {
    Arc::new(MetricsRegistry::new("kube_").unwrap())
}

/// An `autoscaling/v1` object as the API server would serve it.
pub fn hpa(name: &str, namespace: &str, target: &str) -> HorizontalPodAutoscaler {
    hpa_with_annotations(name, namespace, target, json!({}))
}

pub fn hpa_with_annotations(
    name: &str,
    namespace: &str,
    target: &str,
    annotations: serde_json::Value,
) -> HorizontalPodAutoscaler {
    serde_json::from_value(json!({
        "apiVersion": "autoscaling/v1",
        "kind": "HorizontalPodAutoscaler",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": annotations,
        },
        "spec": {
            "scaleTargetRef": { "apiVersion": "apps/v1", "kind": "Deployment", "name": target },
            "minReplicas": 2,
            "maxReplicas": 10,
        },
        "status": {
            "currentReplicas": 3,
            "desiredReplicas": 4,
        },
    }))
    .unwrap()
}

/// The web/default scenario used across tests.
pub fn web_snapshot() -> AutoscalerSnapshot {
    AutoscalerSnapshot::from(&hpa("web", "default", "web-deploy"))
}

/// Legacy annotation with one entry of every kind.
pub fn current_metrics_annotation() -> String {
    json!([
        { "type": "Object", "object": { "metricName": "requests", "averageValue": "1234m" } },
        { "type": "Pods", "pods": { "metricName": "qps", "currentAverageValue": "250m" } },
        { "type": "External", "external": { "metricName": "queue_depth", "currentAverageValue": "2k" } },
    ])
    .to_string()
}

pub fn target_metrics_annotation() -> String {
    json!([
        { "type": "Object", "object": { "metricName": "requests", "targetValue": "2" } },
        { "type": "Pods", "pods": { "metricName": "qps", "targetAverageValue": "500m" } },
        { "type": "External", "external": { "metricName": "queue_depth", "targetAverageValue": "1Ki" } },
    ])
    .to_string()
}
