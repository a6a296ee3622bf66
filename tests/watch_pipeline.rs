//! Watch source, queue and router driven by scripted watcher streams.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use hpa_exporter::k8s::{HpaWatcher, WatchError};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use kube::runtime::watcher::{Error, Event};

mod common;

type Item = Result<Event<HorizontalPodAutoscaler>, Error>;

fn events_total(metrics: &hpa_exporter::MetricsRegistry, kind: &str) -> u64 {
    metrics
        .exporter()
        .watch_events_total
        .with_label_values(&[kind])
        .get()
}

#[tokio::test]
async fn test_initial_list_then_incremental_changes() {
    let metrics = common::registry();
    let script: Vec<Item> = vec![
        Ok(Event::Init),
        Ok(Event::InitApply(common::hpa("web", "default", "web-deploy"))),
        Ok(Event::InitApply(common::hpa("api", "default", "api-deploy"))),
        Ok(Event::InitDone),
        Ok(Event::Apply(common::hpa("web", "default", "web-deploy-v2"))),
        Ok(Event::Delete(common::hpa("api", "default", "api-deploy"))),
    ];

    HpaWatcher::new(stream::iter(script), metrics.clone(), 4)
        .start()
        .wait()
        .await
        .unwrap();

    let hpa = metrics.hpa();
    assert_eq!(hpa.autoscaler_series("api", "default"), 0);
    assert_eq!(hpa.autoscaler_series("web", "default"), 4);
    assert_eq!(
        hpa.spec_min_replicas
            .get(["web", "default", "web-deploy-v2", "Deployment"]),
        Some(2.0)
    );
    assert_eq!(
        hpa.spec_min_replicas
            .count_matching(&[("targetRef", "web-deploy")]),
        0
    );

    assert_eq!(events_total(&metrics, "add"), 2);
    assert_eq!(events_total(&metrics, "update"), 1);
    assert_eq!(events_total(&metrics, "delete"), 1);
}

#[tokio::test]
async fn test_relist_retracts_vanished_autoscalers() {
    let metrics = common::registry();
    let script: Vec<Item> = vec![
        Ok(Event::Init),
        Ok(Event::InitApply(common::hpa("web", "default", "web-deploy"))),
        Ok(Event::InitApply(common::hpa("api", "default", "api-deploy"))),
        Ok(Event::InitDone),
        // Reconnect: "api" was deleted while the watch was down.
        Ok(Event::Init),
        Ok(Event::InitApply(common::hpa("web", "default", "web-deploy"))),
        Ok(Event::InitDone),
    ];

    HpaWatcher::new(stream::iter(script), metrics.clone(), 1)
        .start()
        .wait()
        .await
        .unwrap();

    assert_eq!(metrics.hpa().autoscaler_series("api", "default"), 0);
    assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 4);
    assert_eq!(events_total(&metrics, "delete"), 1);
}

#[tokio::test]
async fn test_stream_errors_are_counted_and_skipped() {
    let metrics = common::registry();
    let script: Vec<Item> = vec![
        Err(Error::NoResourceVersion),
        Ok(Event::Apply(common::hpa("web", "default", "web-deploy"))),
    ];

    HpaWatcher::new(stream::iter(script), metrics.clone(), 8)
        .start()
        .wait()
        .await
        .unwrap();

    assert_eq!(metrics.exporter().watch_errors_total.get(), 1);
    assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 4);
}

#[tokio::test]
async fn test_stop_halts_an_open_watch() {
    let metrics = common::registry();
    let script: Vec<Item> = vec![Ok(Event::Apply(common::hpa("web", "default", "web-deploy")))];
    let open_stream = stream::iter(script).chain(stream::pending());

    let running = HpaWatcher::new(open_stream, metrics.clone(), 8).start();

    tokio::time::timeout(Duration::from_secs(5), async {
        while metrics.hpa().autoscaler_series("web", "default") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("event was never applied");

    running.stop(Duration::from_secs(5)).await.unwrap();
    assert_eq!(metrics.hpa().autoscaler_series("web", "default"), 4);
}

#[tokio::test]
async fn test_stop_before_any_event() {
    let metrics = common::registry();
    let running = HpaWatcher::new(stream::pending::<Item>(), metrics.clone(), 8).start();

    running.stop(Duration::from_secs(5)).await.unwrap();
    assert_eq!(metrics.hpa().status_current_replicas.series_count(), 0);
}

#[tokio::test]
async fn test_stop_applies_every_accepted_event() {
    let metrics = common::registry();
    let pulled = Arc::new(AtomicUsize::new(0));

    let counter = pulled.clone();
    let script: Vec<Item> = (0..200)
        .map(|i| Ok(Event::Apply(common::hpa(&format!("web-{i}"), "default", "web-deploy"))))
        .collect();
    let open_stream = stream::iter(script)
        .inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .chain(stream::pending());

    // A single-slot queue keeps the source ahead of the router.
    let running = HpaWatcher::new(open_stream, metrics.clone(), 1).start();

    tokio::time::timeout(Duration::from_secs(5), async {
        while pulled.load(Ordering::SeqCst) < 50 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("source never read the stream");

    running.stop(Duration::from_secs(5)).await.unwrap();

    let accepted = pulled.load(Ordering::SeqCst);
    assert!(accepted >= 50);
    assert_eq!(events_total(&metrics, "add"), accepted as u64);
    assert_eq!(metrics.hpa().spec_max_replicas.series_count(), accepted);
}

#[tokio::test]
async fn test_panicking_source_is_reported() {
    let metrics = common::registry();
    let broken = stream::poll_fn(|_| -> Poll<Option<Item>> { panic!("watch stream exploded") });

    let result = HpaWatcher::new(broken, metrics, 4).start().wait().await;

    assert!(matches!(result, Err(WatchError::Task(e)) if e.is_panic()));
}
