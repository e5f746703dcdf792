/// invalidation requests and the commands they turn into
///
use std::fmt;

use crate::cluster::resolver::CacheKey;

/// the payload published by the default producers for a full reload
pub const RELOAD_SENTINEL: &str = "configReload";

/// reload the node's vcl from its canonical location
pub const RELOAD_COMMAND: &str = "varnishreload /etc/varnish/default.vcl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationRequest {
    FullReload,
    TargetedBan { service: String },
}

impl InvalidationRequest {
    /// the sentinel means a full reload, any other payload names a service
    pub fn parse(payload: &str, reload_sentinel: &str) -> InvalidationRequest {
        if payload == reload_sentinel {
            InvalidationRequest::FullReload
        } else {
            InvalidationRequest::TargetedBan {
                service: payload.to_string(),
            }
        }
    }
}

impl fmt::Display for InvalidationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationRequest::FullReload => write!(f, "reload"),
            InvalidationRequest::TargetedBan { service } => write!(f, "ban {}", service),
        }
    }
}

/// what a cache node is told to do, once the request has been resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Reload,
    Ban(CacheKey),
}

impl Directive {
    /// the shell command for this directive; `reload_command` is used as is
    pub fn command(&self, reload_command: &str) -> String {
        match self {
            Directive::Reload => reload_command.to_string(),
            Directive::Ban(key) => format!("varnishadm ban req.http.host == {}", key),
        }
    }
}

/// wrap a command for the node's shell
pub fn shell(command: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()]
}
