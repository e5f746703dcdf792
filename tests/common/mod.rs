// in-memory cluster used by the integration tests
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use cache_broadcaster::cluster::{
    CacheNodeInstance, ExecOutput, FleetDirectory, RemoteExecutor, ServiceDirectory, ServiceEntry,
};
use cache_broadcaster::config::CacheConfig;
use cache_broadcaster::errors::ExecError;

#[derive(Default)]
pub struct FakeCluster {
    pub services: Vec<ServiceEntry>,
    pub nodes: Vec<CacheNodeInstance>,
    pub services_down: bool,
    pub fleet_down: bool,
    /// instances whose exec returns an error
    pub failing: Vec<String>,
    /// instances whose exec never returns
    pub hanging: Vec<String>,
    /// each exec sleeps a random 0..max_delay_ms
    pub max_delay_ms: u64,
    pub service_calls: AtomicUsize,
    pub fleet_calls: AtomicUsize,
    pub finished: AtomicUsize,
    pub executed: Mutex<Vec<(String, Vec<String>, Instant)>>,
}

impl FakeCluster {
    pub fn new() -> FakeCluster {
        FakeCluster::default()
    }

    pub fn with_service(mut self, name: &str, namespace: &str) -> FakeCluster {
        self.services.push(ServiceEntry::new(name, namespace));
        self
    }

    /// a varnish pod with the cache-service container, ready or not
    pub fn with_node(mut self, name: &str, ready: bool) -> FakeCluster {
        self.nodes.push(node(name, &[("exporter", true), ("cache-service", ready)]));
        self
    }

    pub fn with_nodes(mut self, count: usize) -> FakeCluster {
        for n in 0..count {
            self.nodes
                .push(node(&format!("varnish-{}", n), &[("cache-service", true)]));
        }
        self
    }

    pub fn services_calls(&self) -> usize {
        self.service_calls.load(Ordering::SeqCst)
    }

    pub fn fleet_calls(&self) -> usize {
        self.fleet_calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// every command run so far, by instance
    pub fn commands(&self) -> Vec<(String, Vec<String>)> {
        self.executed
            .lock()
            .expect("lock")
            .iter()
            .map(|(name, cmd, _)| (name.clone(), cmd.clone()))
            .collect()
    }

    pub fn finished_at(&self, instance: &str) -> Option<Instant> {
        self.executed
            .lock()
            .expect("lock")
            .iter()
            .find(|(name, _, _)| name == instance)
            .map(|(_, _, at)| *at)
    }
}

pub fn node(name: &str, roles: &[(&str, bool)]) -> CacheNodeInstance {
    CacheNodeInstance {
        name: name.to_string(),
        namespace: "varnish".to_string(),
        roles: roles.iter().map(|(r, _)| r.to_string()).collect(),
        ready: roles.iter().map(|(_, ok)| *ok).collect(),
    }
}

pub fn cache_config(timeout_secs: u64) -> CacheConfig {
    CacheConfig {
        exec_timeout_secs: timeout_secs,
        ..CacheConfig::default()
    }
}

#[async_trait]
impl ServiceDirectory for FakeCluster {
    async fn list_services(&self) -> Result<Vec<ServiceEntry>> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        if self.services_down {
            return Err(anyhow!("services is forbidden"));
        }
        Ok(self.services.clone())
    }
}

#[async_trait]
impl FleetDirectory for FakeCluster {
    async fn list_instances(&self, namespace: &str) -> Result<Vec<CacheNodeInstance>> {
        self.fleet_calls.fetch_add(1, Ordering::SeqCst);
        if self.fleet_down {
            return Err(anyhow!("pods is forbidden"));
        }
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.namespace == namespace)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RemoteExecutor for FakeCluster {
    async fn exec(
        &self,
        _namespace: &str,
        instance: &str,
        _role: &str,
        command: &[String],
    ) -> std::result::Result<ExecOutput, ExecError> {
        if self.max_delay_ms > 0 {
            let ms = fastrand::u64(0..self.max_delay_ms);
            async_std::task::sleep(Duration::from_millis(ms)).await;
        }

        if self.hanging.iter().any(|n| n == instance) {
            futures::future::pending::<()>().await;
        }

        if let Ok(mut executed) = self.executed.lock() {
            executed.push((instance.to_string(), command.to_vec(), Instant::now()));
        }
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.failing.iter().any(|n| n == instance) {
            return Err(ExecError::NonZeroExit("command terminated with exit code 1".to_string()));
        }

        Ok(ExecOutput {
            stdout: "200".to_string(),
            stderr: String::new(),
        })
    }
}
