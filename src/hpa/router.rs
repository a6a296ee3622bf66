//! Serialized handling of autoscaler watch events.
//!
//! # State Transitions
//! ```text
//! Added(new)         → apply(new)
//! Updated(old, new)  → retract(old); apply(new)
//! Deleted(old)       → retract(old)
//! ```
//!
//! An update is a full retract-then-apply rather than a diff: the scale
//! target is part of every label set, so re-pointing it would otherwise leave
//! series behind under the old target.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::hpa::projection::{Action, Projector};
use crate::hpa::snapshot::AutoscalerSnapshot;
use crate::metrics::MetricsRegistry;

/// One change notification for an autoscaler.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added(AutoscalerSnapshot),
    Updated {
        old: AutoscalerSnapshot,
        new: AutoscalerSnapshot,
    },
    Deleted(AutoscalerSnapshot),
}

impl WatchEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "add",
            Self::Updated { .. } => "update",
            Self::Deleted(_) => "delete",
        }
    }
}

/// Routes events to the projector, one at a time.
#[derive(Clone)]
pub struct EventRouter {
    projector: Projector,
    metrics: Arc<MetricsRegistry>,
}

impl EventRouter {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            projector: Projector::new(metrics.clone()),
            metrics,
        }
    }

    pub fn handle(&self, event: WatchEvent) {
        self.metrics
            .exporter()
            .watch_events_total
            .with_label_values(&[event.kind()])
            .inc();

        match event {
            WatchEvent::Added(snapshot) => {
                tracing::debug!(hpa = %snapshot.key(), "Autoscaler added");
                self.projector.project(&snapshot, Action::Apply);
            }
            WatchEvent::Updated { old, new } => {
                tracing::debug!(hpa = %new.key(), "Autoscaler updated");
                self.projector.project(&old, Action::Retract);
                self.projector.project(&new, Action::Apply);
            }
            WatchEvent::Deleted(snapshot) => {
                tracing::debug!(hpa = %snapshot.key(), "Autoscaler deleted");
                self.projector.project(&snapshot, Action::Retract);
            }
        }
    }

    /// Process events until every sender is dropped and the queue is empty.
    pub async fn run(self, mut events: mpsc::Receiver<WatchEvent>) {
        tracing::debug!("Event router started");
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        tracing::debug!("Event router drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(target: &str) -> AutoscalerSnapshot {
        AutoscalerSnapshot {
            name: "web".into(),
            namespace: "default".into(),
            target_ref_name: target.into(),
            target_ref_kind: "Deployment".into(),
            min_replicas: 1,
            max_replicas: 5,
            current_replicas: 2,
            desired_replicas: 2,
            ..AutoscalerSnapshot::default()
        }
    }

    #[test]
    fn test_update_retracts_old_target() {
        let metrics = Arc::new(MetricsRegistry::new("").unwrap());
        let router = EventRouter::new(metrics.clone());

        router.handle(WatchEvent::Added(snapshot("v1")));
        router.handle(WatchEvent::Updated {
            old: snapshot("v1"),
            new: snapshot("v2"),
        });

        let hpa = metrics.hpa();
        assert_eq!(hpa.spec_max_replicas.count_matching(&[("targetRef", "v1")]), 0);
        assert_eq!(hpa.spec_max_replicas.count_matching(&[("targetRef", "v2")]), 1);
        assert_eq!(
            metrics
                .exporter()
                .watch_events_total
                .with_label_values(&["update"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_run_drains_queue_after_senders_drop() {
        let metrics = Arc::new(MetricsRegistry::new("").unwrap());
        let router = EventRouter::new(metrics.clone());
        let (tx, rx) = mpsc::channel(8);

        tx.send(WatchEvent::Added(snapshot("v1"))).await.unwrap();
        tx.send(WatchEvent::Deleted(snapshot("v1"))).await.unwrap();
        tx.send(WatchEvent::Added(snapshot("v3"))).await.unwrap();
        drop(tx);

        router.run(rx).await;

        assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 4);
        assert_eq!(
            metrics
                .hpa()
                .spec_min_replicas
                .count_matching(&[("targetRef", "v3")]),
            1
        );
    }
}
