//! Translation of raw watcher events into add/update/delete notifications.
//!
//! `kube::runtime::watcher` reports objects as "applied" or "deleted" and
//! brackets every (re)list with `Init`/`InitDone`. The router needs the
//! previous snapshot on update and an explicit delete for objects that
//! vanished while the watch was disconnected, so the last seen snapshot of
//! every autoscaler is kept here.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use kube::runtime::watcher;

use crate::hpa::{AutoscalerSnapshot, ResourceKey, WatchEvent};

#[derive(Debug, Default)]
pub struct InformerCache {
    known: BTreeMap<ResourceKey, AutoscalerSnapshot>,
    /// Keys seen since the last `Init`, while a relist is in progress.
    relist: Option<BTreeSet<ResourceKey>>,
}

impl InformerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: watcher::Event<HorizontalPodAutoscaler>) -> Vec<WatchEvent> {
        match event {
            watcher::Event::Apply(object) => vec![self.upsert(AutoscalerSnapshot::from(&object))],
            watcher::Event::Delete(object) => {
                let snapshot = AutoscalerSnapshot::from(&object);
                self.known.remove(&snapshot.key());
                vec![WatchEvent::Deleted(snapshot)]
            }
            watcher::Event::Init => {
                tracing::debug!(known = self.known.len(), "Autoscaler relist started");
                self.relist = Some(BTreeSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(object) => {
                let snapshot = AutoscalerSnapshot::from(&object);
                self.relist
                    .get_or_insert_with(BTreeSet::new)
                    .insert(snapshot.key());
                vec![self.upsert(snapshot)]
            }
            watcher::Event::InitDone => {
                let seen = self.relist.take().unwrap_or_default();
                let stale: Vec<ResourceKey> = self
                    .known
                    .keys()
                    .filter(|key| !seen.contains(*key))
                    .cloned()
                    .collect();

                tracing::debug!(
                    listed = seen.len(),
                    stale = stale.len(),
                    "Autoscaler relist complete"
                );

                stale
                    .into_iter()
                    .filter_map(|key| self.known.remove(&key))
                    .map(WatchEvent::Deleted)
                    .collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    fn upsert(&mut self, snapshot: AutoscalerSnapshot) -> WatchEvent {
        match self.known.insert(snapshot.key(), snapshot.clone()) {
            Some(old) => WatchEvent::Updated { old, new: snapshot },
            None => WatchEvent::Added(snapshot),
        }
    }
}
