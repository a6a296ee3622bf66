//! Kubernetes integration.
//!
//! # Responsibilities
//! - Build the API client from a kubeconfig or in-cluster credentials
//! - Watch `autoscaling/v1` HorizontalPodAutoscalers in all namespaces
//! - Turn watcher output into ordered add/update/delete events
//!
//! # Design Decisions
//! - One source task and one router task per watch; events are never
//!   processed concurrently
//! - Relists reconcile against the last seen objects, so deletions missed
//!   while disconnected still retract their series

pub mod client;
pub mod error;
pub mod informer;
pub mod watcher;

pub use client::build_client;
pub use error::{ClientError, WatchError};
pub use informer::InformerCache;
pub use watcher::{HpaWatcher, RunningWatcher};
