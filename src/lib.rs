#![doc = include_str!("../README.md")]

pub mod cluster;
pub mod config;
pub mod errors;
pub mod fanout;
pub mod invalidation;
pub mod logging;
pub mod status;
pub mod subscriber;

/// the current app version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
