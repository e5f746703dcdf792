/// the cluster seen by the broadcaster: a service directory, a fleet directory
/// and a way to run a command inside a cache node.
///
/// the traits are the seams; `kubernetes` holds the kubernetes implementation and
/// the tests substitute fakes.
///
pub mod discovery;
pub mod kubernetes;
pub mod resolver;

use anyhow::Result;
use async_trait::async_trait;

/// fixed cluster-internal dns suffix appended to `<service>.<namespace>`
pub const CLUSTER_DOMAIN: &str = "svc.cluster.local";

/// a service as listed by the cluster-wide directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub namespace: String,
}

impl ServiceEntry {
    pub fn new(name: &str, namespace: &str) -> ServiceEntry {
        ServiceEntry {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

/// one running cache node; `ready[i]` reports the health of `roles[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNodeInstance {
    pub name: String,
    pub namespace: String,
    pub roles: Vec<String>,
    pub ready: Vec<bool>,
}

impl CacheNodeInstance {
    /// the first role named `role` whose readiness flag is set.
    /// a missing flag counts as not ready.
    pub fn ready_role(&self, role: &str) -> Option<&str> {
        self.roles.iter().enumerate().find_map(|(idx, name)| {
            let ready = self.ready.get(idx).copied().unwrap_or(false);
            (name == role && ready).then_some(name.as_str())
        })
    }
}

/// output captured from one remote session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// every service in every namespace
    async fn list_services(&self) -> Result<Vec<ServiceEntry>>;
}

#[async_trait]
pub trait FleetDirectory: Send + Sync {
    /// every instance in `namespace`, ready or not
    async fn list_instances(&self, namespace: &str) -> Result<Vec<CacheNodeInstance>>;
}

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// run `command` (already wrapped for the shell) in `role` of `instance`.
    /// a non-success remote status is an error.
    async fn exec(
        &self,
        namespace: &str,
        instance: &str,
        role: &str,
        command: &[String],
    ) -> std::result::Result<ExecOutput, crate::errors::ExecError>;
}
