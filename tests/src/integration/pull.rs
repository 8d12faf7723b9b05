//! # Pull Consistency
//!
//! Replicas expire after their TTR and are revalidated by polling the origin.

#[cfg(test)]
mod tests {
    use crate::simulation::Cluster;
    use dn_peer::{Consistency, ConsistencyMode, LazyPoller, PeerApi, PeerError, Timestamp};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    const ORIGIN: u16 = 8001;
    const REPLICA: u16 = 8002;
    const FAR: u16 = 8003;

    /// Origin and replica, with the replica downloaded at t=0 (TTR 1000 ms).
    async fn replicated() -> Cluster {
        let cluster = Cluster::line(ConsistencyMode::Pull, &[ORIGIN, REPLICA, FAR]);
        cluster.own_file(ORIGIN, "x.txt", b"x");
        cluster.get(REPLICA, "x.txt").await;
        cluster.network().clear_log();
        cluster
    }

    fn state(cluster: &Cluster, port: u16) -> Consistency {
        cluster
            .peer(port)
            .list_files()
            .find("x.txt")
            .map(|entry| entry.state)
            .unwrap()
    }

    #[tokio::test]
    async fn test_expired_replica_is_revalidated_by_poll() {
        let cluster = replicated().await;
        let replica = cluster.peer(REPLICA).replica("x.txt").unwrap();
        assert_eq!(replica.ttr, Some(Duration::from_millis(1_000)));
        assert_eq!(replica.last_polled_time, Timestamp::from_millis(0));

        // Nothing is due before the deadline.
        cluster.clock().advance(Duration::from_millis(999));
        assert!(cluster.peer(REPLICA).lazy_poll().await.is_empty());
        assert_eq!(state(&cluster, REPLICA), Consistency::Valid);

        cluster.clock().advance(Duration::from_millis(501));
        assert_eq!(state(&cluster, REPLICA), Consistency::TtrExpired);

        let report = cluster.peer(REPLICA).lazy_poll().await;

        assert_eq!(report.revalidated, vec!["x.txt".to_string()]);
        let replica = cluster.peer(REPLICA).replica("x.txt").unwrap();
        assert_eq!(replica.stored_consistency(), Consistency::Valid);
        assert_eq!(replica.last_polled_time, Timestamp::from_millis(1_500));
        assert_eq!(replica.version, 0);

        cluster.clock().advance(Duration::from_millis(999));
        assert_eq!(state(&cluster, REPLICA), Consistency::Valid);
        cluster.clock().advance(Duration::from_millis(1));
        assert_eq!(state(&cluster, REPLICA), Consistency::TtrExpired);
    }

    #[tokio::test]
    async fn test_poll_after_edit_invalidates_then_refresh_recovers() {
        let cluster = replicated().await;
        cluster.edit(ORIGIN, "x.txt").await;

        // Until the TTR runs out the stale replica stays valid.
        assert_eq!(state(&cluster, REPLICA), Consistency::Valid);

        cluster.clock().advance(Duration::from_millis(1_000));
        let report = cluster.peer(REPLICA).lazy_poll().await;
        assert_eq!(report.invalidated, vec!["x.txt".to_string()]);
        assert!(matches!(
            cluster.peer(REPLICA).on_obtain("x.txt").await,
            Err(PeerError::NotServable(_))
        ));

        let report = cluster.peer(REPLICA).refresh(Some("x.txt")).await;

        assert_eq!(report.downloaded, vec!["x.txt".to_string()]);
        let replica = cluster.peer(REPLICA).replica("x.txt").unwrap();
        assert_eq!(replica.version, 1);
        assert_eq!(replica.stored_consistency(), Consistency::Valid);
        assert_eq!(replica.last_polled_time, Timestamp::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_refresh_polls_expired_replicas_first() {
        let cluster = replicated().await;
        cluster.edit(ORIGIN, "x.txt").await;
        cluster.clock().advance(Duration::from_millis(2_000));

        let report = cluster.peer(REPLICA).refresh(None).await;

        assert_eq!(report.poll.invalidated, vec!["x.txt".to_string()]);
        assert_eq!(report.downloaded, vec!["x.txt".to_string()]);
        assert_eq!(cluster.peer(REPLICA).replica("x.txt").unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_expired_replica_does_not_answer_searches() {
        let cluster = replicated().await;
        cluster.clock().advance(Duration::from_millis(1_000));

        cluster.get(FAR, "x.txt").await;

        // The query passes through the expired replica to the origin.
        let obtains = cluster.network().obtains();
        assert_eq!(obtains.len(), 1);
        assert_eq!(obtains[0].0, Cluster::id(FAR));
        assert_eq!(obtains[0].1, Cluster::id(ORIGIN));
        assert_eq!(cluster.network().deliveries(&Cluster::id(FAR), "hitQuery").len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_origin_leaves_replica_expired() {
        let cluster = replicated().await;
        cluster.network().set_down(Cluster::id(ORIGIN));
        cluster.clock().advance(Duration::from_millis(1_000));

        let report = cluster.peer(REPLICA).lazy_poll().await;

        assert_eq!(report.failed, vec!["x.txt".to_string()]);
        assert_eq!(
            cluster.peer(REPLICA).replica("x.txt").unwrap().stored_consistency(),
            Consistency::TtrExpired
        );

        cluster.network().set_up(&Cluster::id(ORIGIN));
        let report = cluster.peer(REPLICA).lazy_poll().await;
        assert_eq!(report.revalidated, vec!["x.txt".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_poller_revalidates() {
        let cluster = replicated().await;
        cluster.clock().advance(Duration::from_millis(1_200));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = LazyPoller::new(
            Arc::clone(cluster.peer(REPLICA)),
            Duration::from_millis(100),
        );

        let handle = poller.spawn(shutdown_rx);
        tokio::time::sleep(Duration::from_millis(150)).await;

        let replica = cluster.peer(REPLICA).replica("x.txt").unwrap();
        assert_eq!(replica.last_polled_time, Timestamp::from_millis(1_200));
        assert_eq!(replica.stored_consistency(), Consistency::Valid);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
