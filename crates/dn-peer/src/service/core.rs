use futures::future::join_all;
use parking_lot::Mutex;
use shared_types::{MessageId, PeerId, PeerMessage, Timestamp};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::consistency::ConsistencyStrategy;
use crate::domain::{DanFile, MessageCache, PeerResult, PendingRequests, ReplicaTable};
use crate::ports::{FileStore, Namespace, PeerNetwork, TimeSource};

/// Mutable protocol state of one node. Only ever touched under
/// [`PeerService`]'s lock.
#[derive(Debug)]
pub(crate) struct PeerState {
    pub(crate) replicas: ReplicaTable,
    pub(crate) cache: MessageCache,
    pub(crate) pending: PendingRequests,
    /// Filenames whose downloaded bytes are being written.
    pub(crate) downloading: HashSet<String>,
    next_sequence: u64,
}

impl PeerState {
    fn new(cache_size: usize) -> Self {
        Self {
            replicas: ReplicaTable::new(),
            cache: MessageCache::new(cache_size),
            pending: PendingRequests::new(),
            downloading: HashSet::new(),
            next_sequence: 0,
        }
    }

    /// Allocates the next id originating at `origin`.
    pub(crate) fn next_message_id(&mut self, origin: &PeerId) -> MessageId {
        let id = MessageId::new(origin.clone(), self.next_sequence);
        self.next_sequence += 1;
        id
    }
}

/// A Danutella peer implementing the driving port.
///
/// All state lives behind one mutex. Handlers take the lock for their
/// lookups and updates, release it, and only then call other peers.
///
/// # Example
///
/// ```rust,ignore
/// use dn_peer::{NodeConfig, PeerApi, PeerService};
///
/// let service = PeerService::new(config, network, store, time_source);
/// service.discover_owned_files().await?;
/// let search = service.get("x.txt").await;
/// ```
pub struct PeerService<N: PeerNetwork, F: FileStore> {
    pub(crate) id: PeerId,
    pub(crate) neighbors: Vec<PeerId>,
    pub(crate) config: NodeConfig,
    pub(crate) strategy: ConsistencyStrategy,
    pub(crate) state: Mutex<PeerState>,
    pub(crate) network: Arc<N>,
    pub(crate) store: Arc<F>,
    pub(crate) time_source: Arc<dyn TimeSource>,
}

impl<N: PeerNetwork, F: FileStore> PeerService<N, F> {
    /// Create a new peer.
    ///
    /// # Arguments
    ///
    /// * `config` - Identity, neighbours and protocol parameters
    /// * `network` - Channel to other peers
    /// * `store` - Owned and replica file storage
    /// * `time_source` - Provider for current time
    pub fn new(
        config: NodeConfig,
        network: Arc<N>,
        store: Arc<F>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let strategy = ConsistencyStrategy::from_config(&config.consistency);
        Self {
            id: config.identity.local.clone(),
            neighbors: config.identity.neighbors.clone(),
            state: Mutex::new(PeerState::new(config.search.message_cache_size)),
            strategy,
            config,
            network,
            store,
            time_source,
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    pub fn neighbors(&self) -> &[PeerId] {
        &self.neighbors
    }

    pub fn strategy(&self) -> ConsistencyStrategy {
        self.strategy
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Snapshot of the record for `filename`.
    pub fn replica(&self, filename: &str) -> Option<DanFile> {
        self.state.lock().replicas.get(filename).cloned()
    }

    /// True if a search with this id still awaits a hit.
    pub fn is_pending(&self, id: &MessageId) -> bool {
        self.state.lock().pending.contains(id)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// True if `id` is in the dedup cache.
    pub fn has_seen(&self, id: &MessageId) -> bool {
        self.state.lock().cache.seen(id)
    }

    /// Registers a file this node is origin for, at version 0. Does nothing
    /// if a record with that name already exists.
    pub fn add_owned_file(&self, filename: impl Into<String>) -> bool {
        let filename = filename.into();
        let now = self.now();
        let mut state = self.state.lock();
        if state.replicas.contains(&filename) {
            return false;
        }
        debug!(%filename, "Registered owned file");
        state.replicas.insert(DanFile::owned(
            filename,
            self.id.clone(),
            now,
            self.strategy.advertised_ttr(),
        ));
        true
    }

    /// Creates owner records for every file in owned storage.
    pub async fn discover_owned_files(&self) -> PeerResult<usize> {
        let names = self.store.list(Namespace::Owned).await?;
        let added = names
            .into_iter()
            .filter(|name| self.add_owned_file(name.as_str()))
            .count();
        info!(peer = %self.id, files = added, "Discovered owned files");
        Ok(added)
    }

    /// Sends `message` to one peer. Failure is logged as a lost message.
    pub(crate) async fn deliver(&self, to: &PeerId, message: PeerMessage) -> bool {
        let kind = message.kind();
        match self.network.send(to, message).await {
            Ok(()) => true,
            Err(err) => {
                warn!(to = %to, kind, error = %err, "Message lost");
                false
            }
        }
    }

    /// Sends `message` to every neighbour concurrently. Returns how many
    /// sends succeeded.
    pub(crate) async fn broadcast(&self, message: PeerMessage) -> usize {
        let sends = self
            .neighbors
            .iter()
            .map(|neighbor| self.deliver(neighbor, message.clone()));
        join_all(sends).await.into_iter().filter(|sent| *sent).count()
    }
}
