use anyhow::Result;
use clap::Parser;
use log::*;
use std::sync::Arc;

use cache_broadcaster::cluster::kubernetes::KubeCluster;
use cache_broadcaster::config::Cli;
use cache_broadcaster::fanout::broadcaster::Broadcaster;
use cache_broadcaster::fanout::orchestrator::Orchestrator;
use cache_broadcaster::{logging, subscriber, VERSION};

#[async_std::main]
async fn main() -> Result<()> {
    let config = Cli::parse().load()?;
    logging::init(&config.log)?;

    info!("cache-broadcaster version: {}", VERSION);
    info!(
        "redis: {}, channel: {}, cache nodes: {}/{}",
        config.redis, config.channel, config.cache.namespace, config.cache.container
    );

    let cluster = Arc::new(KubeCluster::connect(config.kubeconfig.as_deref()).await?);
    let orchestrator = Orchestrator::new(
        cluster.clone(),
        cluster.clone(),
        cluster,
        config.cache.clone(),
    );

    let broadcaster = Broadcaster::start(orchestrator);
    let result = subscriber::subscribe(
        config.redis.connection_info(),
        &config.channel,
        broadcaster.request_channel(),
    )
    .await;

    broadcaster.join().await;

    result
}
