/// error taxonomy for a fan-out cycle.
///
/// resolution and discovery errors abandon the current cycle; execution errors
/// are recorded per target and never leave the executor.
///
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("service not found: {0}")]
    NotFound(String),

    #[error("service directory unavailable: {0:#}")]
    DirectoryUnavailable(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("unable to list cache nodes in namespace {namespace}: {source:#}")]
    ListFailed {
        namespace: String,
        source: anyhow::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("session failed: {0:#}")]
    Session(anyhow::Error),

    #[error("command exited with {0}")]
    NonZeroExit(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("execution unit exited without a result")]
    Lost,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
