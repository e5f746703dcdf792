/// redis pub/sub subscriber that feeds the broadcaster.
///
/// every payload on the channel becomes a `Command::Invalidate`. a lost
/// connection is re-established with exponential backoff; the subscriber only
/// returns once the broadcaster stops accepting requests.
///
use anyhow::{anyhow, Context, Result};
use async_channel::Sender;
use futures::StreamExt;
use log::*;
use redis::{Client, ConnectionInfo};
use std::time::Duration;

use crate::fanout::broadcaster::Command;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// a client that cannot be built from `info` is a config error and returns
/// at once; connection problems are retried
pub async fn subscribe(
    info: ConnectionInfo,
    channel: &str,
    requests: Sender<Command>,
) -> Result<()> {
    let client = Client::open(info).context("creating redis client")?;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        match forward(&client, channel, &requests, &mut backoff).await {
            Ok(()) => {
                info!("request channel closed, unsubscribing from {}", channel);
                return Ok(());
            }
            Err(e) if requests.is_closed() => {
                info!("request channel closed after subscriber error: {:#}", e);
                return Ok(());
            }
            Err(e) => {
                error!(
                    "subscriber error: {:#}, reconnecting in {}s",
                    e,
                    backoff.as_secs()
                );
                async_std::task::sleep(backoff).await;
                backoff = next_backoff(backoff);
            }
        }
    }
}

// Ok means the broadcaster went away; every connection problem is an error
async fn forward(
    client: &Client,
    channel: &str,
    requests: &Sender<Command>,
    backoff: &mut Duration,
) -> Result<()> {
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .context("connecting to redis")?;

    pubsub
        .subscribe(channel)
        .await
        .with_context(|| format!("subscribing to {}", channel))?;

    info!("subscribed to channel {}", channel);
    *backoff = INITIAL_BACKOFF;

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("skipping unreadable payload on {}: {}", channel, e);
                continue;
            }
        };

        debug!("received: {}", payload);
        if requests.send(Command::Invalidate(payload)).await.is_err() {
            return Ok(());
        }
    }

    Err(anyhow!("pub/sub connection closed"))
}
