use anyhow::Result;
use async_channel::{bounded, Receiver, Sender};
use async_std::task::JoinHandle;
use log::*;

use super::orchestrator::Orchestrator;
use crate::status::{JsonString, OrchestratorState, SharedState};

/// how many requests may queue while a cycle is running
pub const REQUEST_BUFFER: usize = 250;

#[derive(Debug, Clone)]
pub enum Command {
    Invalidate(String),         // a raw payload from the channel
    Status(Sender<JsonString>), // answered between cycles, so the state reads Idle
    Shutdown,
}

// the handler loop; commands are taken one at a time so cycles never overlap
pub async fn handler(mut orchestrator: Orchestrator, rx: Receiver<Command>) -> Result<()> {
    let id = orchestrator.id();
    let mut error_count = 0;

    while let Ok(cmd) = rx.recv().await {
        debug!("recv cmd: {:?}", cmd);
        match cmd {
            Command::Invalidate(payload) => {
                orchestrator.run_cycle(&payload).await;
            }
            Command::Status(tx) => {
                let msg = orchestrator.status().to_json();
                info!("status response: {}", msg);
                if tx.send(msg).await.is_err() {
                    error_count += 1;
                    error!("error returning status to channel, errors: {}", error_count);
                }
            }
            Command::Shutdown => {
                orchestrator.shutdown();
                info!("broadcaster id: {}, state: {:?}", id, orchestrator.state());
                break;
            }
        }
    }

    rx.close();

    Ok(())
}

#[derive(Debug)]
pub struct Broadcaster {
    id: String,
    state: SharedState,
    request_tx: Sender<Command>,
    handle: JoinHandle<()>,
}

impl Broadcaster {
    /// start the handler loop for `orchestrator` as a background task.
    pub fn start(orchestrator: Orchestrator) -> Broadcaster {
        let id = orchestrator.id();
        let state = orchestrator.shared_state();
        info!("starting broadcaster, id: {}", id);

        let (request_tx, request_receiver) = bounded(REQUEST_BUFFER);

        let hid = id.clone();
        let handle = async_std::task::spawn(async move {
            match handler(orchestrator, request_receiver).await {
                Ok(()) => info!("broadcaster handler exit for id: {}", hid),
                Err(e) => error!("broadcaster exit with error: {:?}", e),
            }
        });

        Broadcaster {
            id,
            state,
            request_tx,
            handle,
        }
    }

    pub fn id(&self) -> String {
        self.id.to_string()
    }

    /// the live orchestrator state, including mid-cycle
    pub fn state(&self) -> OrchestratorState {
        self.state.get()
    }

    /// the sender used by the subscriber (and anyone else) to submit requests
    pub fn request_channel(&self) -> Sender<Command> {
        self.request_tx.clone()
    }

    /// wait for the handler loop to finish, after a shutdown or once every
    /// sender is gone
    pub async fn join(self) {
        drop(self.request_tx);
        self.handle.await;
    }
}
