/// configuration: defaults, then an optional json file, then flags and env vars
///
use clap::Parser;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::invalidation::{RELOAD_COMMAND, RELOAD_SENTINEL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: String::new(),
            db: 0,
        }
    }
}

impl RedisConfig {
    /// host, port, db and password as separate fields, so the password needs
    /// no url escaping
    pub fn connection_info(&self) -> ConnectionInfo {
        let password = if self.password.is_empty() {
            None
        } else {
            Some(self.password.clone())
        };

        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                password,
                ..RedisConnectionInfo::default()
            },
        }
    }
}

impl fmt::Display for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.db)
    }
}

/// where the cache nodes live and what they are told to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub namespace: String,
    pub container: String,
    pub reload_sentinel: String,
    pub reload_command: String,
    pub exec_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            namespace: "varnish".to_string(),
            container: "cache-service".to_string(),
            reload_sentinel: RELOAD_SENTINEL.to_string(),
            reload_command: RELOAD_COMMAND.to_string(),
            exec_timeout_secs: 20,
        }
    }
}

impl CacheConfig {
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub config_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            config_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub redis: RedisConfig,
    pub channel: String,
    pub cache: CacheConfig,
    pub kubeconfig: Option<PathBuf>,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            redis: RedisConfig::default(),
            channel: "cleanCache".to_string(),
            cache: CacheConfig::default(),
            kubeconfig: None,
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// read a json config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("channel", &self.channel),
            ("cache.namespace", &self.cache.namespace),
            ("cache.container", &self.cache.container),
            ("cache.reload_sentinel", &self.cache.reload_sentinel),
            ("cache.reload_command", &self.cache.reload_command),
            ("redis.host", &self.redis.host),
        ];

        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
        }

        if self.redis.port == 0 {
            return Err(ConfigError::Invalid("redis.port must not be 0".to_string()));
        }

        if self.redis.db < 0 {
            return Err(ConfigError::Invalid(
                "redis.db must not be negative".to_string(),
            ));
        }

        redis::Client::open(self.redis.connection_info())
            .map_err(|e| ConfigError::Invalid(format!("redis connection: {}", e)))?;

        if self.cache.exec_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.exec_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// command line flags; each one overrides the config file
#[derive(Debug, Default, Parser)]
#[command(name = "cache-broadcaster", version, about)]
pub struct Cli {
    /// json config file
    #[arg(short, long, env = "BROADCASTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// ip address or hostname of redis
    #[arg(long, env = "REDIS_HOST")]
    pub redis_host: Option<String>,

    #[arg(long, env = "REDIS_PORT")]
    pub redis_port: Option<u16>,

    #[arg(long, env = "REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,

    #[arg(long, env = "REDIS_DB")]
    pub redis_db: Option<i64>,

    /// pub/sub channel carrying invalidation requests
    #[arg(long, env = "SUBSCRIBE_CHANNEL")]
    pub subscribe_channel: Option<String>,

    /// kubernetes namespace of the varnish pods
    #[arg(long, env = "VARNISH_NAMESPACE")]
    pub varnish_namespace: Option<String>,

    /// name of the varnish container inside each pod
    #[arg(long, env = "VARNISH_CONTAINER")]
    pub varnish_container: Option<String>,

    #[arg(long, env = "RELOAD_SENTINEL")]
    pub reload_sentinel: Option<String>,

    /// seconds before a single exec session is given up
    #[arg(long, env = "EXEC_TIMEOUT")]
    pub exec_timeout: Option<u64>,

    /// kubeconfig used when not running inside the cluster
    #[arg(long, env = "BROADCASTER_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// log4rs yaml file; replaces the console logger
    #[arg(long, env = "LOG_CONFIG")]
    pub log_config: Option<PathBuf>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// layer the flags over the config file (or the defaults) and validate
    pub fn load(self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        self.apply(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn apply(self, config: &mut Config) {
        if let Some(v) = self.redis_host {
            config.redis.host = v;
        }
        if let Some(v) = self.redis_port {
            config.redis.port = v;
        }
        if let Some(v) = self.redis_password {
            config.redis.password = v;
        }
        if let Some(v) = self.redis_db {
            config.redis.db = v;
        }
        if let Some(v) = self.subscribe_channel {
            config.channel = v;
        }
        if let Some(v) = self.varnish_namespace {
            config.cache.namespace = v;
        }
        if let Some(v) = self.varnish_container {
            config.cache.container = v;
        }
        if let Some(v) = self.reload_sentinel {
            config.cache.reload_sentinel = v;
        }
        if let Some(v) = self.exec_timeout {
            config.cache.exec_timeout_secs = v;
        }
        if self.kubeconfig.is_some() {
            config.kubeconfig = self.kubeconfig;
        }
        if self.log_config.is_some() {
            config.log.config_file = self.log_config;
        }
        if let Some(v) = self.log_level {
            config.log.level = v;
        }
    }
}
