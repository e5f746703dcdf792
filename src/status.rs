/// orchestrator state and status structs
///
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub type JsonString = String;

pub const OK: &str = "ok";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Resolving,
    Executing,
    Shutdown,
}

impl OrchestratorState {
    fn from_u8(value: u8) -> OrchestratorState {
        match value {
            1 => OrchestratorState::Resolving,
            2 => OrchestratorState::Executing,
            3 => OrchestratorState::Shutdown,
            _ => OrchestratorState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            OrchestratorState::Idle => 0,
            OrchestratorState::Resolving => 1,
            OrchestratorState::Executing => 2,
            OrchestratorState::Shutdown => 3,
        }
    }
}

/// the orchestrator's current state, readable from other tasks while a cycle
/// is running
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub fn get(&self) -> OrchestratorState {
        OrchestratorState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: OrchestratorState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// running totals since the orchestrator started
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub completed: u64,
    pub dropped: u64,
    pub abandoned: u64,
    pub failed_targets: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub id: String,
    pub status: String,
    pub state: OrchestratorState,
    pub stats: CycleStats,
    pub last_cycle: Option<String>,
}

impl OrchestratorStatus {
    pub fn new(
        id: String,
        state: OrchestratorState,
        stats: CycleStats,
        last_cycle: Option<String>,
    ) -> OrchestratorStatus {
        OrchestratorStatus {
            id,
            status: OK.to_string(),
            state,
            stats,
            last_cycle,
        }
    }

    pub fn to_json(&self) -> JsonString {
        match serde_json::to_string(self) {
            Ok(js) => js,
            Err(e) => format!(r#"{}"status":"json parse error: {:?}"{}"#, "{", e, "}"),
        }
    }
}
