/// maps a logical service name to the host key the cache nodes record
///
use log::*;

use super::{ServiceDirectory, CLUSTER_DOMAIN};
use crate::errors::ResolveError;

/// the resolved `<service>.<namespace>.svc.cluster.local` identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(service: &str, namespace: &str) -> CacheKey {
        CacheKey(format!("{}.{}.{}", service, namespace, CLUSTER_DOMAIN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// exact, case-sensitive lookup; the first match in listing order wins when
/// the same name exists in several namespaces.
pub async fn resolve(
    directory: &dyn ServiceDirectory,
    service: &str,
) -> Result<CacheKey, ResolveError> {
    let services = directory
        .list_services()
        .await
        .map_err(ResolveError::DirectoryUnavailable)?;

    debug!("searching {} services for {}", services.len(), service);

    services
        .iter()
        .find(|entry| entry.name == service)
        .map(|entry| CacheKey::new(&entry.name, &entry.namespace))
        .ok_or_else(|| ResolveError::NotFound(service.to_string()))
}
