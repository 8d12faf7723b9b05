//! # Push Consistency
//!
//! An owner's edit floods an invalidation to every reachable replica.

#[cfg(test)]
mod tests {
    use crate::simulation::{Cluster, DeliveryOrder};
    use dn_peer::{Consistency, ConsistencyMode, Namespace, PeerApi, PeerMessage};

    const OWNER: u16 = 8001;

    /// Ring 8001..8004 with a chord, so invalidations arrive over several paths.
    fn meshed(order: DeliveryOrder) -> Cluster {
        let ports = [8001, 8002, 8003, 8004];
        let edges = [(8001, 8002), (8002, 8003), (8003, 8004), (8004, 8001), (8001, 8003)];
        Cluster::build(ConsistencyMode::Push, &ports, &edges, order, |_, _| {})
    }

    /// Owner at version 3, every other peer holding a valid v3 replica.
    async fn replicated_at_v3(cluster: &Cluster) {
        cluster.own_file(OWNER, "x.txt", b"v3");
        for _ in 0..3 {
            cluster.edit(OWNER, "x.txt").await;
        }
        for port in cluster.ports().filter(|p| *p != OWNER) {
            cluster.get(port, "x.txt").await;
            let replica = cluster.peer(port).replica("x.txt").unwrap();
            assert_eq!(replica.version, 3);
        }
        cluster.network().clear_log();
    }

    fn invalidations_of(cluster: &Cluster, port: u16, version: u64) -> Vec<dn_peer::Delivery> {
        cluster
            .network()
            .log()
            .into_iter()
            .filter(|record| record.to == Cluster::id(port))
            .filter(|record| {
                matches!(record.message, PeerMessage::Invalidate { version: v, .. } if v == version)
            })
            .map(|record| record.delivery)
            .collect()
    }

    async fn assert_edit_invalidates_every_replica_once(cluster: Cluster) {
        replicated_at_v3(&cluster).await;

        assert_eq!(cluster.edit(OWNER, "x.txt").await, 4);

        for port in cluster.ports().filter(|p| *p != OWNER) {
            let replica = cluster.peer(port).replica("x.txt").unwrap();
            assert_eq!(replica.stored_consistency(), Consistency::Invalid, "peer {port}");
            assert_eq!(replica.version, 3);

            let deliveries = invalidations_of(&cluster, port, 4);
            assert!(deliveries.len() > 1, "peer {port} had a single path");
            assert_eq!(deliveries.iter().filter(|d| d.is_accepted()).count(), 1);
        }
        let owner = cluster.peer(OWNER).replica("x.txt").unwrap();
        assert_eq!(owner.version, 4);
        assert_eq!(owner.stored_consistency(), Consistency::Valid);
    }

    #[tokio::test]
    async fn test_edit_invalidates_every_replica_once() {
        assert_edit_invalidates_every_replica_once(meshed(DeliveryOrder::Fifo)).await;
    }

    #[tokio::test]
    async fn test_edit_invalidates_under_reordering() {
        assert_edit_invalidates_every_replica_once(meshed(DeliveryOrder::Lifo)).await;
    }

    #[tokio::test]
    async fn test_invalid_replica_is_not_served() {
        let cluster = meshed(DeliveryOrder::Fifo);
        replicated_at_v3(&cluster).await;
        cluster.edit(OWNER, "x.txt").await;

        // Every replica is invalid now, so only the owner can answer.
        let id = cluster.peer(8003).get("x.txt").await;
        cluster.settle().await;

        assert!(!cluster.peer(8003).is_pending(&id));
        let obtains = cluster.network().obtains();
        assert_eq!(obtains.len(), 1);
        assert_eq!(obtains[0].1, Cluster::id(OWNER));
        assert_eq!(cluster.peer(8003).replica("x.txt").unwrap().version, 4);
    }

    #[tokio::test]
    async fn test_refresh_pulls_new_content_from_origin() {
        let cluster = meshed(DeliveryOrder::Fifo);
        replicated_at_v3(&cluster).await;
        cluster.store(OWNER).put(Namespace::Owned, "x.txt", b"v4");
        cluster.edit(OWNER, "x.txt").await;

        let report = cluster.peer(8002).refresh(None).await;

        assert_eq!(report.downloaded, vec!["x.txt".to_string()]);
        let replica = cluster.peer(8002).replica("x.txt").unwrap();
        assert_eq!(replica.version, 4);
        assert_eq!(replica.stored_consistency(), Consistency::Valid);
        assert_eq!(
            cluster.store(8002).get(Namespace::Replica, "x.txt").as_deref(),
            Some(&b"v4"[..])
        );
        // The others are still invalid until they refresh.
        assert_eq!(
            cluster.peer(8004).replica("x.txt").unwrap().stored_consistency(),
            Consistency::Invalid
        );
    }

    #[tokio::test]
    async fn test_unreachable_replica_misses_invalidation() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[8001, 8002, 8003]);
        replicated_at_v3(&cluster).await;
        cluster.network().set_down(Cluster::id(8003));

        cluster.edit(OWNER, "x.txt").await;

        assert_eq!(
            cluster.peer(8002).replica("x.txt").unwrap().stored_consistency(),
            Consistency::Invalid
        );
        // Lost, not retried: 8003 keeps serving its stale copy.
        cluster.network().set_up(&Cluster::id(8003));
        cluster.settle().await;
        assert_eq!(
            cluster.peer(8003).replica("x.txt").unwrap().stored_consistency(),
            Consistency::Valid
        );
    }

    #[tokio::test]
    async fn test_pull_mode_edit_sends_no_invalidation() {
        let cluster = Cluster::line(ConsistencyMode::Pull, &[8001, 8002]);
        cluster.own_file(OWNER, "x.txt", b"x");
        cluster.get(8002, "x.txt").await;
        cluster.network().clear_log();

        cluster.edit(OWNER, "x.txt").await;

        assert!(cluster.network().log().is_empty());
        assert_eq!(
            cluster.peer(8002).replica("x.txt").unwrap().stored_consistency(),
            Consistency::Valid
        );
    }
}
