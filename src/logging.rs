/// log4rs setup: a yaml file when one is configured, a console logger otherwise
///
use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::str::FromStr;

use crate::config::LogConfig;

pub const PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {l} {t} - {m}{n}";

pub fn console_config(level: &str) -> Result<Config> {
    let level = LevelFilter::from_str(level).map_err(|_| anyhow!("invalid log level: {}", level))?;

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;

    Ok(config)
}

pub fn init(config: &LogConfig) -> Result<()> {
    match &config.config_file {
        Some(path) => log4rs::init_file(path, Default::default())
            .with_context(|| format!("loading log config {}", path.display()))?,
        None => {
            log4rs::init_config(console_config(&config.level)?)?;
        }
    }

    Ok(())
}
