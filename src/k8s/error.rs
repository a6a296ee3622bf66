use std::path::PathBuf;
use std::time::Duration;

use kube::config::{InClusterError, KubeconfigError};
use thiserror::Error;
use tokio::task::JoinError;

/// Errors raised while building the Kubernetes client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to load kubeconfig {path}: {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: KubeconfigError,
    },

    #[error("failed to load in-cluster configuration: {0}")]
    InCluster(#[source] InClusterError),

    #[error("failed to initialize Kubernetes client: {0}")]
    Client(#[source] Box<kube::Error>),
}

/// Errors raised while stopping the autoscaler watch.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("autoscaler watch did not stop within {0:?}")]
    StopTimeout(Duration),

    #[error("autoscaler watch task failed: {0}")]
    Task(#[source] JoinError),
}
