/// drives one fan-out cycle per invalidation request
///
use log::*;
use std::sync::Arc;

use super::executor;
use super::report::{CycleOutcome, FanOutReport};
use crate::cluster::discovery::discover;
use crate::cluster::resolver::resolve;
use crate::cluster::{FleetDirectory, RemoteExecutor, ServiceDirectory};
use crate::config::CacheConfig;
use crate::errors::ResolveError;
use crate::invalidation::{Directive, InvalidationRequest};
use crate::status::{CycleStats, OrchestratorState, OrchestratorStatus, SharedState};

pub struct Orchestrator {
    services: Arc<dyn ServiceDirectory>,
    fleet: Arc<dyn FleetDirectory>,
    executor: Arc<dyn RemoteExecutor>,
    config: CacheConfig,
    state: SharedState,
    stats: CycleStats,
    last_cycle: Option<String>,
}

impl Orchestrator {
    pub fn new(
        services: Arc<dyn ServiceDirectory>,
        fleet: Arc<dyn FleetDirectory>,
        executor: Arc<dyn RemoteExecutor>,
        config: CacheConfig,
    ) -> Orchestrator {
        Orchestrator {
            services,
            fleet,
            executor,
            config,
            state: SharedState::default(),
            stats: CycleStats::default(),
            last_cycle: None,
        }
    }

    /// `<namespace>/<container>`, the fleet this orchestrator drives
    pub fn id(&self) -> String {
        format!("{}/{}", self.config.namespace, self.config.container)
    }

    pub fn state(&self) -> OrchestratorState {
        self.state.get()
    }

    /// a handle that follows the state while `run_cycle` is in progress
    pub fn shared_state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus::new(
            self.id(),
            self.state.get(),
            self.stats.clone(),
            self.last_cycle.clone(),
        )
    }

    pub(crate) fn shutdown(&mut self) {
        self.transition(OrchestratorState::Shutdown);
    }

    fn transition(&mut self, next: OrchestratorState) {
        debug!("{}: {:?} -> {:?}", self.id(), self.state.get(), next);
        self.state.set(next);
    }

    /// run one complete cycle for `payload` and log its summary line.
    /// nothing in here is fatal; the orchestrator is always idle afterwards.
    pub async fn run_cycle(&mut self, payload: &str) -> CycleOutcome {
        self.transition(OrchestratorState::Resolving);

        let request = InvalidationRequest::parse(payload, &self.config.reload_sentinel);
        let outcome = self.fan_out(request).await;

        match &outcome {
            CycleOutcome::Completed(report) => {
                self.stats.completed += 1;
                self.stats.failed_targets += report.failures.len() as u64;
                if report.is_success() {
                    info!("{}", outcome);
                } else {
                    warn!("{}", outcome);
                }
            }
            CycleOutcome::Dropped { .. } => {
                self.stats.dropped += 1;
                warn!("{}", outcome);
            }
            CycleOutcome::Abandoned { .. } => {
                self.stats.abandoned += 1;
                warn!("{}", outcome);
            }
        }

        self.last_cycle = Some(outcome.to_string());
        self.transition(OrchestratorState::Idle);

        outcome
    }

    async fn fan_out(&mut self, request: InvalidationRequest) -> CycleOutcome {
        let directive = match &request {
            InvalidationRequest::FullReload => Directive::Reload,
            InvalidationRequest::TargetedBan { service } => {
                match resolve(self.services.as_ref(), service).await {
                    Ok(key) => Directive::Ban(key),
                    Err(ResolveError::NotFound(service)) => {
                        return CycleOutcome::Dropped { service };
                    }
                    Err(e) => {
                        return CycleOutcome::Abandoned {
                            request: request.to_string(),
                            reason: e.to_string(),
                        };
                    }
                }
            }
        };

        let command = directive.command(&self.config.reload_command);
        debug!("{}: command: {}", request, command);

        let targets = match discover(
            self.fleet.as_ref(),
            &self.config.namespace,
            &self.config.container,
            &command,
        )
        .await
        {
            Ok(targets) => targets,
            Err(e) => {
                return CycleOutcome::Abandoned {
                    request: request.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        self.transition(OrchestratorState::Executing);

        let results =
            executor::execute(self.executor.clone(), targets, self.config.exec_timeout()).await;

        CycleOutcome::Completed(FanOutReport::new(request, results))
    }
}
