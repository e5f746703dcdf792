/// runs one command on every target concurrently and waits for all of them
///
use async_channel::bounded;
use log::*;
use std::sync::Arc;
use std::time::Duration;

use super::report::ExecutionResult;
use crate::cluster::discovery::ExecutionTarget;
use crate::cluster::RemoteExecutor;
use crate::errors::ExecError;
use crate::invalidation::shell;

/// one unit: open the session, run the command, give up after `timeout`
async fn run_unit(
    executor: Arc<dyn RemoteExecutor>,
    target: ExecutionTarget,
    timeout: Duration,
) -> ExecutionResult {
    let command = shell(&target.command);
    let session = executor.exec(&target.namespace, &target.instance, &target.role, &command);

    let outcome = match async_std::future::timeout(timeout, session).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ExecError::Timeout(timeout)),
    };

    match &outcome {
        Ok(output) => info!("{}: {} {}", target, output.stdout, output.stderr),
        Err(e) => error!("{}: {}", target, e),
    }

    ExecutionResult { target, outcome }
}

/// spawn one unit per target and return once every unit has reported.
///
/// units never cancel each other. a unit that dies before sending its result
/// is reported as lost, so there is always one result per target.
pub async fn execute(
    executor: Arc<dyn RemoteExecutor>,
    targets: Vec<ExecutionTarget>,
    timeout: Duration,
) -> Vec<ExecutionResult> {
    let count = targets.len();
    let (tx, rx) = bounded(count.max(1));

    for (idx, target) in targets.iter().cloned().enumerate() {
        let tx = tx.clone();
        let executor = executor.clone();
        async_std::task::spawn(async move {
            let result = run_unit(executor, target, timeout).await;
            if tx.send((idx, result)).await.is_err() {
                error!("error returning result for unit {}", idx);
            }
        });
    }

    // the receiver closes once every unit has dropped its sender
    drop(tx);

    let mut slots: Vec<Option<ExecutionResult>> = (0..count).map(|_| None).collect();
    while let Ok((idx, result)) = rx.recv().await {
        slots[idx] = Some(result);
    }

    slots
        .into_iter()
        .zip(targets)
        .map(|(slot, target)| {
            slot.unwrap_or_else(|| {
                error!("{}: {}", target, ExecError::Lost);
                ExecutionResult {
                    target,
                    outcome: Err(ExecError::Lost),
                }
            })
        })
        .collect()
}
