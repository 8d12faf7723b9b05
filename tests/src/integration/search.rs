//! # Flooding Search
//!
//! Queries spread hop by hop under a TTL; hits retrace the query path.

#[cfg(test)]
mod tests {
    use crate::simulation::Cluster;
    use dn_peer::{Consistency, ConsistencyMode, Delivery, DropReason, Namespace, PeerApi};

    const A: u16 = 8001;
    const B: u16 = 8002;
    const C: u16 = 8003;

    fn accepted(deliveries: &[Delivery]) -> usize {
        deliveries.iter().filter(|d| d.is_accepted()).count()
    }

    // =============================================================================
    // LINE A - B - C
    // =============================================================================

    #[tokio::test]
    async fn test_line_search_back_traces_hit_to_origin() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B, C]);
        cluster.own_file(C, "x.txt", b"from c");

        let id = cluster.get(A, "x.txt").await;
        let network = cluster.network();

        // B relays the query exactly once; the copy C sends back is a duplicate.
        let at_b = network.deliveries(&Cluster::id(B), "query");
        assert_eq!(accepted(&at_b), 1);
        assert!(at_b.contains(&Delivery::Dropped(DropReason::Duplicate)));

        // C answers B, B back-traces to A.
        assert_eq!(network.deliveries(&Cluster::id(B), "hitQuery"), vec![Delivery::Accepted]);
        assert_eq!(network.deliveries(&Cluster::id(A), "hitQuery"), vec![Delivery::Accepted]);

        let a = cluster.peer(A);
        assert!(!a.is_pending(&id));
        let replica = a.replica("x.txt").unwrap();
        assert_eq!(replica.origin_server, Cluster::id(C));
        assert_eq!(replica.stored_consistency(), Consistency::Valid);
        assert_eq!(
            cluster.store(A).get(Namespace::Replica, "x.txt").as_deref(),
            Some(&b"from c"[..])
        );
        assert_eq!(
            network.obtains(),
            vec![(Cluster::id(A), Cluster::id(C), "x.txt".to_string())]
        );
    }

    #[tokio::test]
    async fn test_replica_serves_later_searches() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B, C]);
        cluster.own_file(C, "x.txt", b"from c");
        cluster.get(B, "x.txt").await;
        cluster.network().clear_log();

        cluster.get(A, "x.txt").await;

        // B is one hop closer than C, so its hit arrives first.
        let obtains = cluster.network().obtains();
        assert_eq!(obtains.len(), 1);
        assert_eq!(obtains[0].1, Cluster::id(B));
        assert_eq!(
            cluster.peer(A).replica("x.txt").unwrap().origin_server,
            Cluster::id(C)
        );
    }

    #[tokio::test]
    async fn test_missing_file_leaves_search_pending() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B, C]);

        let id = cluster.get(A, "nowhere.txt").await;

        assert!(cluster.peer(A).is_pending(&id));
        assert!(cluster.network().deliveries(&Cluster::id(A), "hitQuery").is_empty());
        assert!(cluster.peer(A).replica("nowhere.txt").is_none());
    }

    // =============================================================================
    // REDUNDANT PATHS
    // =============================================================================

    #[tokio::test]
    async fn test_triangle_duplicate_query_yields_single_hit() {
        let cluster = Cluster::new(ConsistencyMode::Push, &[A, B, C], &[(A, B), (B, C), (C, A)]);
        cluster.own_file(C, "x.txt", b"x");

        let id = cluster.get(A, "x.txt").await;
        let network = cluster.network();

        let at_c = network.deliveries_of(&Cluster::id(C), &id);
        assert_eq!(accepted(&at_c), 1);
        assert!(at_c.len() > 1);

        let hits: usize = cluster
            .ports()
            .map(|port| network.deliveries(&Cluster::id(port), "hitQuery").len())
            .sum();
        assert_eq!(hits, 1);
        assert_eq!(network.obtains().len(), 1);
        assert!(cluster.peer(A).replica("x.txt").is_some());
    }

    #[tokio::test]
    async fn test_grid_search_reaches_far_corner() {
        // 3x3 grid, diameter 4:
        //   8001 - 8002 - 8003
        //    |      |      |
        //   8004 - 8005 - 8006
        //    |      |      |
        //   8007 - 8008 - 8009
        let ports: Vec<u16> = (8001..=8009).collect();
        let mut edges = Vec::new();
        for row in 0..3u16 {
            for col in 0..3u16 {
                let port = 8001 + row * 3 + col;
                if col < 2 {
                    edges.push((port, port + 1));
                }
                if row < 2 {
                    edges.push((port, port + 3));
                }
            }
        }
        let cluster = Cluster::new(ConsistencyMode::Push, &ports, &edges);
        cluster.own_file(8009, "far.txt", b"corner");

        let id = cluster.get(8001, "far.txt").await;

        let a = cluster.peer(8001);
        assert!(!a.is_pending(&id));
        assert_eq!(a.replica("far.txt").unwrap().origin_server, Cluster::id(8009));
        assert_eq!(cluster.network().obtains().len(), 1);
    }

    // =============================================================================
    // TTL
    // =============================================================================

    #[tokio::test]
    async fn test_holder_at_ttl_edge_still_answers() {
        // The holder is six hops out and receives the query with TTL 0.
        let ports: Vec<u16> = (8001..=8007).collect();
        let cluster = Cluster::line(ConsistencyMode::Push, &ports);
        cluster.own_file(8007, "x.txt", b"x");

        let id = cluster.get(8001, "x.txt").await;

        assert!(!cluster.peer(8001).is_pending(&id));
        assert!(cluster.peer(8001).replica("x.txt").is_some());
    }

    #[tokio::test]
    async fn test_holder_beyond_ttl_is_not_reached() {
        let ports: Vec<u16> = (8001..=8008).collect();
        let cluster = Cluster::line(ConsistencyMode::Push, &ports);
        cluster.own_file(8008, "x.txt", b"x");

        let id = cluster.get(8001, "x.txt").await;

        assert!(cluster.peer(8001).is_pending(&id));
        assert!(cluster.network().deliveries(&Cluster::id(8008), "query").is_empty());
        assert_eq!(cluster.network().deliveries(&Cluster::id(8007), "query").len(), 1);
    }

    // =============================================================================
    // DEDUP CACHE
    // =============================================================================

    #[tokio::test]
    async fn test_relay_cache_keeps_only_latest_ids() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B]);
        let mut ids = Vec::new();
        for n in 0..12 {
            ids.push(cluster.get(A, &format!("f{n}.txt")).await);
        }

        let b = cluster.peer(B);
        assert!(!b.has_seen(&ids[0]));
        assert!(!b.has_seen(&ids[1]));
        assert!(ids[2..].iter().all(|id| b.has_seen(id)));
        assert_eq!(cluster.peer(A).pending_count(), 12);
    }

    #[tokio::test]
    async fn test_unreachable_neighbour_loses_query() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B, C]);
        cluster.own_file(C, "x.txt", b"x");
        cluster.network().set_down(Cluster::id(B));

        let id = cluster.get(A, "x.txt").await;

        assert!(cluster.peer(A).is_pending(&id));
        assert!(cluster.network().log().is_empty());

        // No retry: bringing B back does not revive the lost search.
        cluster.network().set_up(&Cluster::id(B));
        cluster.settle().await;
        assert!(cluster.peer(A).is_pending(&id));
    }

    #[tokio::test]
    async fn test_local_listing_after_search() {
        let cluster = Cluster::line(ConsistencyMode::Push, &[A, B]);
        cluster.own_file(A, "mine.txt", b"m");
        cluster.own_file(B, "theirs.txt", b"t");

        cluster.get(A, "theirs.txt").await;

        let listing = cluster.peer(A).list_files();
        assert_eq!(
            listing.to_string(),
            " +++ mine.txt : { version: 0; state: VALID }\n   - theirs.txt : { version: 0; state: VALID }\n"
        );
    }
}
