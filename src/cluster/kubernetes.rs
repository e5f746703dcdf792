/// kubernetes implementation of the cluster traits.
///
/// services come from every namespace, cache nodes are pods (containers are
/// their roles) and commands run through the pod `exec` subresource.
///
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, AttachParams, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use log::*;
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::{
    CacheNodeInstance, ExecOutput, FleetDirectory, RemoteExecutor, ServiceDirectory, ServiceEntry,
};
use crate::errors::ExecError;

#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// connect with the in-cluster service account, falling back to the
    /// kubeconfig at `kubeconfig` or the default kubeconfig when not in a pod.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<KubeCluster> {
        let config = match Config::incluster() {
            Ok(config) => {
                info!("using in-cluster configuration");
                config
            }
            Err(e) => {
                info!("not running in-cluster ({}), trying kubeconfig", e);
                match kubeconfig {
                    Some(path) => {
                        let file = Kubeconfig::read_from(path)
                            .with_context(|| format!("reading kubeconfig {}", path.display()))?;
                        Config::from_custom_kubeconfig(file, &KubeConfigOptions::default()).await?
                    }
                    None => Config::infer().await?,
                }
            }
        };

        let client = Client::try_from(config).context("creating kubernetes client")?;

        Ok(KubeCluster { client })
    }
}

/// containers become roles, container statuses their readiness flags in the
/// same positions
fn to_instance(pod: Pod) -> Option<CacheNodeInstance> {
    let name = pod.metadata.name?;
    let namespace = pod.metadata.namespace.unwrap_or_default();

    let roles = pod
        .spec
        .map(|spec| spec.containers.into_iter().map(|c| c.name).collect())
        .unwrap_or_default();

    let ready = pod
        .status
        .and_then(|status| status.container_statuses)
        .map(|statuses| statuses.iter().map(|s| s.ready).collect())
        .unwrap_or_default();

    Some(CacheNodeInstance {
        name,
        namespace,
        roles,
        ready,
    })
}

#[async_trait]
impl ServiceDirectory for KubeCluster {
    async fn list_services(&self) -> Result<Vec<ServiceEntry>> {
        let services: Api<Service> = Api::all(self.client.clone());
        let list = services
            .list(&ListParams::default())
            .await
            .context("listing services")?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|svc| {
                Some(ServiceEntry {
                    name: svc.metadata.name?,
                    namespace: svc.metadata.namespace?,
                })
            })
            .collect())
    }
}

#[async_trait]
impl FleetDirectory for KubeCluster {
    async fn list_instances(&self, namespace: &str) -> Result<Vec<CacheNodeInstance>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default())
            .await
            .with_context(|| format!("listing pods in {}", namespace))?;

        Ok(list.items.into_iter().filter_map(to_instance).collect())
    }
}

#[async_trait]
impl RemoteExecutor for KubeCluster {
    async fn exec(
        &self,
        namespace: &str,
        instance: &str,
        role: &str,
        command: &[String],
    ) -> std::result::Result<ExecOutput, ExecError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = AttachParams::default()
            .container(role)
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        let mut process = pods
            .exec(instance, command.to_vec(), &params)
            .await
            .map_err(|e| ExecError::Session(e.into()))?;

        let stdout = process.stdout();
        let stderr = process.stderr();
        let status = process.take_status();

        let mut out = Vec::new();
        let mut err = Vec::new();
        let read_out = async {
            if let Some(mut reader) = stdout {
                reader.read_to_end(&mut out).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let read_err = async {
            if let Some(mut reader) = stderr {
                reader.read_to_end(&mut err).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        futures::try_join!(read_out, read_err).map_err(|e| ExecError::Session(e.into()))?;

        let status = match status {
            Some(status) => status.await,
            None => None,
        };

        process
            .join()
            .await
            .map_err(|e| ExecError::Session(e.into()))?;

        let output = ExecOutput {
            stdout: String::from_utf8_lossy(&out).trim().to_string(),
            stderr: String::from_utf8_lossy(&err).trim().to_string(),
        };

        match status {
            Some(st) if st.status.as_deref() == Some("Failure") => {
                let reason = st
                    .message
                    .or(st.reason)
                    .unwrap_or_else(|| "failure".to_string());
                Err(ExecError::NonZeroExit(reason))
            }
            _ => Ok(output),
        }
    }
}
