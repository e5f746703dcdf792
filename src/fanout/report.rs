/// per-target results and the one-line summary of a cycle
///
use std::fmt;

use crate::cluster::discovery::ExecutionTarget;
use crate::cluster::ExecOutput;
use crate::errors::ExecError;
use crate::invalidation::InvalidationRequest;

#[derive(Debug)]
pub struct ExecutionResult {
    pub target: ExecutionTarget,
    pub outcome: Result<ExecOutput, ExecError>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: ExecutionTarget,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub request: InvalidationRequest,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<TargetFailure>,
}

impl FanOutReport {
    pub fn new(request: InvalidationRequest, results: Vec<ExecutionResult>) -> FanOutReport {
        let attempted = results.len();
        let mut succeeded = 0;
        let mut failures = vec![];

        for result in results {
            match result.outcome {
                Ok(_) => succeeded += 1,
                Err(e) => failures.push(TargetFailure {
                    target: result.target,
                    error: e.to_string(),
                }),
            }
        }

        FanOutReport {
            request,
            attempted,
            succeeded,
            failures,
        }
    }

    /// every node accepted the command, and there was at least one node
    pub fn is_success(&self) -> bool {
        self.attempted > 0 && self.failures.is_empty()
    }
}

impl fmt::Display for FanOutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} cache nodes ok",
            self.request, self.succeeded, self.attempted
        )?;

        if self.attempted == 0 {
            write!(f, ", no ready cache nodes")?;
        }

        for (idx, failure) in self.failures.iter().enumerate() {
            let sep = if idx == 0 { ", failed: " } else { "; " };
            write!(f, "{}{}: {}", sep, failure.target, failure.error)?;
        }

        Ok(())
    }
}

/// how a cycle ended; every cycle produces exactly one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(FanOutReport),
    Dropped { service: String },
    Abandoned { request: String, reason: String },
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&FanOutReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Completed(report) => write!(f, "{}", report),
            CycleOutcome::Dropped { service } => {
                write!(f, "ban {}: service not found, message dropped", service)
            }
            CycleOutcome::Abandoned { request, reason } => {
                write!(f, "{}: cycle abandoned, {}", request, reason)
            }
        }
    }
}
