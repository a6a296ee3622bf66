//! Kubernetes client construction.

use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use crate::k8s::error::ClientError;

/// Build a client from an explicit kubeconfig file, or from the in-cluster
/// service account when no path is given.
pub async fn build_client(kubeconfig: Option<&Path>) -> Result<Client, ClientError> {
    let config = match kubeconfig {
        Some(path) => {
            let to_error = |source| ClientError::Kubeconfig {
                path: path.to_path_buf(),
                source,
            };
            let kubeconfig = Kubeconfig::read_from(path).map_err(to_error)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(to_error)?
        }
        None => Config::incluster().map_err(ClientError::InCluster)?,
    };

    tracing::info!(
        cluster_url = %config.cluster_url,
        default_namespace = %config.default_namespace,
        "Kubernetes configuration loaded"
    );

    Client::try_from(config).map_err(|e| ClientError::Client(Box::new(e)))
}
