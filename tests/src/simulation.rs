//! # Simulated Network
//!
//! Routes messages between in-process peers. Fire-and-forget messages are
//! queued and delivered one at a time by [`SimulatedNetwork::run_until_idle`];
//! `poll` and `obtain` call the target peer directly.

use async_trait::async_trait;
use dn_peer::test_utils::{ManualTimeSource, MemoryFileStore};
use dn_peer::{
    ConsistencyMode, Delivery, MessageId, Namespace, NetworkError, NodeConfig, ObtainedFile,
    PeerApi, PeerId, PeerMessage, PeerNetwork, PeerService, PollResult, TimeSource,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Upper bound on deliveries per [`SimulatedNetwork::run_until_idle`] call.
/// A flood that goes past it did not terminate.
pub const MAX_DELIVERIES: usize = 100_000;

/// Which queued message is delivered next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryOrder {
    #[default]
    Fifo,
    /// Newest first, so messages overtake each other.
    Lifo,
}

/// One delivered message and what its receiver did with it.
#[derive(Debug, Clone)]
pub struct DeliveryRecord {
    pub to: PeerId,
    pub message: PeerMessage,
    pub delivery: Delivery,
}

#[derive(Default)]
pub struct SimulatedNetwork {
    order: DeliveryOrder,
    peers: Mutex<HashMap<PeerId, Arc<dyn PeerApi>>>,
    down: Mutex<HashSet<PeerId>>,
    queue: Mutex<VecDeque<(PeerId, PeerMessage)>>,
    log: Mutex<Vec<DeliveryRecord>>,
    obtains: Mutex<Vec<(PeerId, PeerId, String)>>,
}

impl SimulatedNetwork {
    pub fn new(order: DeliveryOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn register(&self, peer: Arc<dyn PeerApi>) {
        let id = peer.local_id().clone();
        self.peers.lock().insert(id, peer);
    }

    /// Every call to `peer` fails from now on.
    pub fn set_down(&self, peer: PeerId) {
        self.down.lock().insert(peer);
    }

    pub fn set_up(&self, peer: &PeerId) {
        self.down.lock().remove(peer);
    }

    fn lookup(&self, to: &PeerId) -> Result<Arc<dyn PeerApi>, NetworkError> {
        if self.down.lock().contains(to) {
            return Err(NetworkError::ConnectionRefused);
        }
        self.peers
            .lock()
            .get(to)
            .cloned()
            .ok_or(NetworkError::ConnectionRefused)
    }

    fn next(&self) -> Option<(PeerId, PeerMessage)> {
        let mut queue = self.queue.lock();
        match self.order {
            DeliveryOrder::Fifo => queue.pop_front(),
            DeliveryOrder::Lifo => queue.pop_back(),
        }
    }

    /// Delivers queued messages until none are left, including the ones
    /// generated along the way. Returns how many were delivered.
    pub async fn run_until_idle(&self) -> usize {
        let mut delivered = 0;
        while let Some((to, message)) = self.next() {
            delivered += 1;
            assert!(delivered <= MAX_DELIVERIES, "flood did not terminate");

            // A peer that went down after the send loses the message.
            let Ok(peer) = self.lookup(&to) else {
                continue;
            };
            let delivery = peer.on_message(message.clone()).await;
            self.log.lock().push(DeliveryRecord {
                to,
                message,
                delivery,
            });
        }
        delivered
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn log(&self) -> Vec<DeliveryRecord> {
        self.log.lock().clone()
    }

    /// Outcomes of every `kind` message delivered to `peer`.
    pub fn deliveries(&self, peer: &PeerId, kind: &str) -> Vec<Delivery> {
        self.log
            .lock()
            .iter()
            .filter(|record| &record.to == peer && record.message.kind() == kind)
            .map(|record| record.delivery)
            .collect()
    }

    /// Outcomes of every delivery of message `id` to `peer`.
    pub fn deliveries_of(&self, peer: &PeerId, id: &MessageId) -> Vec<Delivery> {
        self.log
            .lock()
            .iter()
            .filter(|record| &record.to == peer && record.message.message_id() == id)
            .map(|record| record.delivery)
            .collect()
    }

    /// `(downloader, source, filename)` of every obtain call.
    pub fn obtains(&self) -> Vec<(PeerId, PeerId, String)> {
        self.obtains.lock().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().clear();
        self.obtains.lock().clear();
    }
}

/// Handle one peer uses to reach the rest of the simulation.
///
/// Obtain calls are attributed to the downloader, so each peer gets its own.
pub struct PeerLink {
    from: PeerId,
    network: Arc<SimulatedNetwork>,
}

impl PeerLink {
    pub fn new(from: PeerId, network: Arc<SimulatedNetwork>) -> Self {
        Self { from, network }
    }
}

#[async_trait]
impl PeerNetwork for PeerLink {
    async fn send(&self, to: &PeerId, message: PeerMessage) -> Result<(), NetworkError> {
        self.network.lookup(to)?;
        self.network.queue.lock().push_back((to.clone(), message));
        Ok(())
    }

    async fn poll(
        &self,
        to: &PeerId,
        version: u64,
        filename: &str,
    ) -> Result<PollResult, NetworkError> {
        let peer = self.network.lookup(to)?;
        peer.on_poll(version, filename)
            .await
            .map_err(|err| NetworkError::Remote(err.to_string()))
    }

    async fn obtain(&self, to: &PeerId, filename: &str) -> Result<ObtainedFile, NetworkError> {
        let peer = self.network.lookup(to)?;
        self.network
            .obtains
            .lock()
            .push((self.from.clone(), to.clone(), filename.to_string()));
        peer.on_obtain(filename)
            .await
            .map_err(|err| NetworkError::Remote(err.to_string()))
    }
}

/// Peers on localhost, keyed by port, sharing one network and one clock.
pub struct Cluster {
    network: Arc<SimulatedNetwork>,
    clock: Arc<ManualTimeSource>,
    peers: BTreeMap<u16, (Arc<ClusterPeer>, Arc<MemoryFileStore>)>,
}

/// A peer wired to a [`Cluster`].
pub type ClusterPeer = PeerService<PeerLink, MemoryFileStore>;

impl Cluster {
    /// Peers joined by undirected `edges`.
    pub fn new(mode: ConsistencyMode, ports: &[u16], edges: &[(u16, u16)]) -> Self {
        Self::build(mode, ports, edges, DeliveryOrder::Fifo, |_, _| {})
    }

    /// Peers joined in a path, in the given order.
    pub fn line(mode: ConsistencyMode, ports: &[u16]) -> Self {
        let edges: Vec<(u16, u16)> = ports.windows(2).map(|w| (w[0], w[1])).collect();
        Self::new(mode, ports, &edges)
    }

    pub fn build(
        mode: ConsistencyMode,
        ports: &[u16],
        edges: &[(u16, u16)],
        order: DeliveryOrder,
        configure: impl Fn(u16, &mut NodeConfig),
    ) -> Self {
        let network = Arc::new(SimulatedNetwork::new(order));
        let clock = Arc::new(ManualTimeSource::new(0));
        let mut peers = BTreeMap::new();

        for &port in ports {
            let neighbors = edges
                .iter()
                .filter_map(|&(a, b)| match port {
                    p if p == a => Some(b),
                    p if p == b => Some(a),
                    _ => None,
                })
                .map(PeerId::localhost)
                .collect();
            let mut config = NodeConfig::for_testing()
                .with_mode(mode)
                .with_identity(PeerId::localhost(port), neighbors);
            configure(port, &mut config);

            let store = Arc::new(MemoryFileStore::new());
            let link = Arc::new(PeerLink::new(PeerId::localhost(port), Arc::clone(&network)));
            let peer = Arc::new(PeerService::new(
                config,
                link,
                Arc::clone(&store),
                Arc::clone(&clock) as Arc<dyn TimeSource>,
            ));
            network.register(Arc::clone(&peer) as Arc<dyn PeerApi>);
            peers.insert(port, (peer, store));
        }

        Self {
            network,
            clock,
            peers,
        }
    }

    pub fn id(port: u16) -> PeerId {
        PeerId::localhost(port)
    }

    pub fn peer(&self, port: u16) -> &Arc<ClusterPeer> {
        &self.peers.get(&port).expect("no such peer").0
    }

    pub fn store(&self, port: u16) -> &Arc<MemoryFileStore> {
        &self.peers.get(&port).expect("no such peer").1
    }

    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.peers.keys().copied()
    }

    pub fn network(&self) -> &SimulatedNetwork {
        &self.network
    }

    pub fn clock(&self) -> &ManualTimeSource {
        &self.clock
    }

    /// Gives `port` an owned file with `bytes`.
    pub fn own_file(&self, port: u16, filename: &str, bytes: &[u8]) {
        self.store(port).put(Namespace::Owned, filename, bytes);
        self.peer(port).add_owned_file(filename);
    }

    /// Searches from `port` and lets the network settle.
    pub async fn get(&self, port: u16, filename: &str) -> MessageId {
        let id = self.peer(port).get(filename).await;
        self.settle().await;
        id
    }

    /// Edits an owned file and lets the network settle.
    pub async fn edit(&self, port: u16, filename: &str) -> u64 {
        let version = self
            .peer(port)
            .edit(filename)
            .await
            .expect("edit of an owned file");
        self.settle().await;
        version
    }

    pub async fn settle(&self) -> usize {
        self.network.run_until_idle().await
    }
}
