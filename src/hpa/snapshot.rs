//! Point-in-time view of one HorizontalPodAutoscaler.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use kube::ResourceExt;

/// Annotation carrying the legacy current-metrics array.
pub const CURRENT_METRICS_ANNOTATION: &str = "autoscaling.alpha.kubernetes.io/current-metrics";

/// Annotation carrying the legacy target-metrics array.
pub const TARGET_METRICS_ANNOTATION: &str = "autoscaling.alpha.kubernetes.io/metrics";

/// The API server fills in `minReplicas: 1` when an object omits it.
const DEFAULT_MIN_REPLICAS: i32 = 1;

/// Identity of an autoscaler within the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Immutable snapshot of the autoscaler fields that are exported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutoscalerSnapshot {
    pub name: String,
    pub namespace: String,
    pub target_ref_name: String,
    pub target_ref_kind: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub current_replicas: i32,
    pub desired_replicas: i32,
    pub annotations: BTreeMap<String, String>,
}

impl AutoscalerSnapshot {
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Label values shared by every exported family, in registration order.
    pub fn scalar_labels(&self) -> [&str; 4] {
        [
            &self.name,
            &self.namespace,
            &self.target_ref_name,
            &self.target_ref_kind,
        ]
    }

    pub fn current_metrics_annotation(&self) -> Option<&str> {
        self.annotations
            .get(CURRENT_METRICS_ANNOTATION)
            .map(String::as_str)
    }

    pub fn target_metrics_annotation(&self) -> Option<&str> {
        self.annotations
            .get(TARGET_METRICS_ANNOTATION)
            .map(String::as_str)
    }
}

impl From<&HorizontalPodAutoscaler> for AutoscalerSnapshot {
    fn from(hpa: &HorizontalPodAutoscaler) -> Self {
        let (target_ref_name, target_ref_kind, min_replicas, max_replicas) = match &hpa.spec {
            Some(spec) => (
                spec.scale_target_ref.name.clone(),
                spec.scale_target_ref.kind.clone(),
                spec.min_replicas.unwrap_or(DEFAULT_MIN_REPLICAS),
                spec.max_replicas,
            ),
            None => (String::new(), String::new(), DEFAULT_MIN_REPLICAS, 0),
        };

        // `currentReplicas` is optional in newer API revisions; accept either shape.
        let (current_replicas, desired_replicas) = hpa
            .status
            .as_ref()
            .map(|status| {
                (
                    Option::<i32>::from(status.current_replicas).unwrap_or_default(),
                    Option::<i32>::from(status.desired_replicas).unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        Self {
            name: hpa.name_any(),
            namespace: hpa.namespace().unwrap_or_default(),
            target_ref_name,
            target_ref_kind,
            min_replicas,
            max_replicas,
            current_replicas,
            desired_replicas,
            annotations: hpa.annotations().clone(),
        }
    }
}
