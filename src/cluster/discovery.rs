/// selects the cache nodes that will receive a command
///
use log::*;
use std::fmt;

use super::FleetDirectory;
use crate::errors::DiscoveryError;

/// one ready cache node and the command it will run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionTarget {
    pub instance: String,
    pub namespace: String,
    pub role: String,
    pub command: String,
}

impl fmt::Display for ExecutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.namespace, self.instance, self.role)
    }
}

/// take a fresh snapshot of `namespace` and build one target per instance
/// that has `role` ready. the snapshot is never reused across cycles.
pub async fn discover(
    fleet: &dyn FleetDirectory,
    namespace: &str,
    role: &str,
    command: &str,
) -> Result<Vec<ExecutionTarget>, DiscoveryError> {
    let instances = fleet
        .list_instances(namespace)
        .await
        .map_err(|source| DiscoveryError::ListFailed {
            namespace: namespace.to_string(),
            source,
        })?;

    let total = instances.len();
    let targets: Vec<ExecutionTarget> = instances
        .iter()
        .filter_map(|node| match node.ready_role(role) {
            Some(role) => Some(ExecutionTarget {
                instance: node.name.clone(),
                namespace: node.namespace.clone(),
                role: role.to_string(),
                command: command.to_string(),
            }),
            None => {
                debug!("skipping {}, no ready {} container", node.name, role);
                None
            }
        })
        .collect();

    info!(
        "discovered {} ready of {} instances in {}",
        targets.len(),
        total,
        namespace
    );

    Ok(targets)
}
