//! Autoscaler watch: stream source, event queue and router worker.
//!
//! ```text
//! watcher stream ──▶ source task (InformerCache) ──▶ mpsc queue ──▶ router worker
//! ```
//!
//! The source is generic over any stream of watcher events, so the same
//! pipeline runs against the cluster or a scripted stream.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::hpa::{EventRouter, WatchEvent};
use crate::k8s::error::WatchError;
use crate::k8s::informer::InformerCache;
use crate::metrics::MetricsRegistry;

pub type HpaEventStream =
    BoxStream<'static, Result<watcher::Event<HorizontalPodAutoscaler>, watcher::Error>>;

/// Watch autoscalers in every namespace, retrying with backoff on errors.
pub fn cluster_stream(client: Client) -> HpaEventStream {
    let api: Api<HorizontalPodAutoscaler> = Api::all(client);
    watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed()
}

/// A configured but not yet running watch.
pub struct HpaWatcher<S> {
    stream: S,
    metrics: Arc<MetricsRegistry>,
    queue_capacity: usize,
}

impl HpaWatcher<HpaEventStream> {
    pub fn for_cluster(client: Client, metrics: Arc<MetricsRegistry>, queue_capacity: usize) -> Self {
        Self::new(cluster_stream(client), metrics, queue_capacity)
    }
}

impl<S> HpaWatcher<S>
where
    S: Stream<Item = Result<watcher::Event<HorizontalPodAutoscaler>, watcher::Error>>
        + Send
        + Unpin
        + 'static,
{
    pub fn new(stream: S, metrics: Arc<MetricsRegistry>, queue_capacity: usize) -> Self {
        Self {
            stream,
            metrics,
            queue_capacity,
        }
    }

    /// Spawn the source and router tasks and return immediately.
    pub fn start(self) -> RunningWatcher {
        let (event_tx, event_rx) = mpsc::channel(self.queue_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();

        let router = EventRouter::new(self.metrics.clone());
        let worker = tokio::spawn(router.run(event_rx));
        let source = tokio::spawn(run_source(self.stream, event_tx, stop_rx, self.metrics));

        tracing::info!(queue_capacity = self.queue_capacity, "Autoscaler watch started");
        RunningWatcher {
            stop_tx,
            source,
            worker,
        }
    }
}

/// Handle to a started watch.
///
/// Dropping the handle without calling [`RunningWatcher::stop`] also halts
/// the source; queued events are still processed by the worker.
pub struct RunningWatcher {
    stop_tx: oneshot::Sender<()>,
    source: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl RunningWatcher {
    /// Halt the source, then wait for the worker to drain the queue.
    ///
    /// Tasks still running after `timeout` are aborted. A panicked task is
    /// reported as [`WatchError::Task`].
    pub async fn stop(self, timeout: Duration) -> Result<(), WatchError> {
        let _ = self.stop_tx.send(());
        let source_abort = self.source.abort_handle();
        let worker_abort = self.worker.abort_handle();

        let drained = tokio::time::timeout(timeout, join_tasks(self.source, self.worker)).await;

        match drained {
            Ok(Ok(())) => {
                tracing::info!("Autoscaler watch stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Autoscaler watch task failed");
                Err(e)
            }
            Err(_) => {
                source_abort.abort();
                worker_abort.abort();
                tracing::warn!(timeout = ?timeout, "Autoscaler watch did not drain in time, aborted");
                Err(WatchError::StopTimeout(timeout))
            }
        }
    }

    /// Wait for the source stream to end on its own and the queue to drain.
    pub async fn wait(self) -> Result<(), WatchError> {
        let result = join_tasks(self.source, self.worker).await;
        drop(self.stop_tx);
        if let Err(e) = &result {
            tracing::error!(error = %e, "Autoscaler watch task failed");
        }
        result
    }
}

/// Await both tasks; the worker is always awaited so the queue drains even
/// when the source failed.
async fn join_tasks(source: JoinHandle<()>, worker: JoinHandle<()>) -> Result<(), WatchError> {
    let source = source.await;
    let worker = worker.await;
    source.and(worker).map_err(WatchError::Task)
}

async fn run_source<S>(
    mut stream: S,
    events: mpsc::Sender<WatchEvent>,
    mut stop: oneshot::Receiver<()>,
    metrics: Arc<MetricsRegistry>,
) where
    S: Stream<Item = Result<watcher::Event<HorizontalPodAutoscaler>, watcher::Error>> + Unpin,
{
    let mut cache = InformerCache::new();

    loop {
        tokio::select! {
            biased;

            _ = &mut stop => {
                tracing::debug!(known = cache.len(), "Autoscaler watch source stopping");
                break;
            }
            next = stream.next() => match next {
                Some(Ok(event)) => {
                    for routed in cache.translate(event) {
                        if events.send(routed).await.is_err() {
                            tracing::warn!("Event router gone, stopping autoscaler watch");
                            return;
                        }
                    }
                }
                Some(Err(e)) => {
                    metrics.exporter().watch_errors_total.inc();
                    tracing::warn!(error = %e, "Autoscaler watch error, will retry");
                }
                None => {
                    tracing::info!("Autoscaler watch stream ended");
                    break;
                }
            },
        }
    }
}
