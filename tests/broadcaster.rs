/// integration tests to ensure the broadcaster handles commands in order and
/// reports its status
///
mod common;

use std::sync::Arc;
use std::time::Duration;

use cache_broadcaster::fanout::broadcaster::{Broadcaster, Command};
use cache_broadcaster::fanout::orchestrator::Orchestrator;
use cache_broadcaster::status::{OrchestratorState, OrchestratorStatus, OK};
use common::{cache_config, FakeCluster};

async fn status(broadcaster: &Broadcaster) -> OrchestratorStatus {
    let (responder, rx) = async_channel::bounded(1);
    broadcaster
        .request_channel()
        .send(Command::Status(responder))
        .await
        .expect("status request should send");

    let js = rx.recv().await.expect("should get a status response");
    serde_json::from_str(&js).expect("status should be json")
}

#[test]
fn single_broadcaster() {
    async_std::task::block_on(async move {
        let cluster = Arc::new(
            FakeCluster {
                max_delay_ms: 10,
                ..FakeCluster::new().with_nodes(3)
            }
            .with_service("billing-api", "prod"),
        );
        let orchestrator = Orchestrator::new(
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            cache_config(5),
        );

        let broadcaster = Broadcaster::start(orchestrator);
        assert_eq!(broadcaster.id(), "varnish/cache-service");

        // fresh status
        let sts = status(&broadcaster).await;
        assert_eq!(sts.status, OK);
        assert_eq!(sts.state, OrchestratorState::Idle);
        assert_eq!(sts.stats.completed, 0);
        assert!(sts.last_cycle.is_none());

        let requests = broadcaster.request_channel();
        for payload in ["billing-api", "unknown-svc", "configReload"] {
            requests
                .send(Command::Invalidate(payload.to_string()))
                .await
                .expect("should queue the request");
        }

        // status is answered after the queued cycles, so they are all done
        let sts = status(&broadcaster).await;
        assert_eq!(sts.state, OrchestratorState::Idle);
        assert_eq!(sts.stats.completed, 2);
        assert_eq!(sts.stats.dropped, 1);
        assert_eq!(sts.stats.abandoned, 0);
        assert_eq!(
            sts.last_cycle.as_deref(),
            Some("reload: 3/3 cache nodes ok")
        );

        // commands ran in delivery order: three bans, then three reloads
        let commands = cluster.commands();
        assert_eq!(commands.len(), 6);
        for (_, cmd) in commands[..3].iter() {
            assert!(cmd[2].starts_with("varnishadm ban"));
        }
        for (_, cmd) in commands[3..].iter() {
            assert!(cmd[2].starts_with("varnishreload"));
        }

        assert!(requests.send(Command::Shutdown).await.is_ok());
        broadcaster.join().await;

        // the handler is gone and has closed its channel
        assert!(requests.is_closed());
    });
}

#[test]
fn join_after_senders_dropped() {
    async_std::task::block_on(async move {
        let cluster = Arc::new(FakeCluster::new().with_nodes(1));
        let orchestrator = Orchestrator::new(
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            cache_config(5),
        );

        let broadcaster = Broadcaster::start(orchestrator);
        let requests = broadcaster.request_channel();
        requests
            .send(Command::Invalidate("configReload".to_string()))
            .await
            .expect("should queue the request");
        drop(requests);

        // queued work still completes before the loop exits
        broadcaster.join().await;
        assert_eq!(cluster.finished(), 1);
    });
}

#[test]
fn state_is_visible_mid_cycle() {
    async_std::task::block_on(async move {
        // one node never answers, so the cycle sits in Executing until the timeout
        let cluster = Arc::new(FakeCluster {
            hanging: vec!["varnish-0".to_string()],
            ..FakeCluster::new().with_nodes(2)
        });
        let orchestrator = Orchestrator::new(
            cluster.clone(),
            cluster.clone(),
            cluster.clone(),
            cache_config(1),
        );

        let broadcaster = Broadcaster::start(orchestrator);
        assert_eq!(broadcaster.state(), OrchestratorState::Idle);

        broadcaster
            .request_channel()
            .send(Command::Invalidate("configReload".to_string()))
            .await
            .expect("should queue the request");

        let mut seen_executing = false;
        for _ in 0..50 {
            if broadcaster.state() == OrchestratorState::Executing {
                seen_executing = true;
                break;
            }
            async_std::task::sleep(Duration::from_millis(10)).await;
        }
        assert!(seen_executing, "state should reach Executing");

        // the status reply waits for the cycle, which ends with the timeout
        let sts = status(&broadcaster).await;
        assert_eq!(sts.state, OrchestratorState::Idle);
        assert_eq!(sts.stats.failed_targets, 1);
        assert_eq!(broadcaster.state(), OrchestratorState::Idle);

        let requests = broadcaster.request_channel();
        assert!(requests.send(Command::Shutdown).await.is_ok());
        broadcaster.join().await;
    });
}
