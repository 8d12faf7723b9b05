//! # Node Runtime
//!
//! Owns the peer and its background tasks: the TCP listener, and in pull
//! mode the lazy poller.

use anyhow::{Context, Result};
use dn_peer::adapters::{FsFileStore, PeerListener, SystemTimeSource, TcpPeerNetwork};
use dn_peer::{LazyPoller, NodeConfig, PeerApi, PeerService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The peer as wired in production.
pub type Peer = PeerService<TcpPeerNetwork, FsFileStore>;

/// A running node.
pub struct NodeRuntime {
    peer: Arc<Peer>,
    store: Arc<FsFileStore>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        let store = Arc::new(FsFileStore::from_config(&config.storage));
        let network = Arc::new(TcpPeerNetwork::new(config.network.io_timeout));
        let peer = Arc::new(PeerService::new(
            config,
            network,
            Arc::clone(&store),
            Arc::new(SystemTimeSource::new()),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            peer,
            store,
            shutdown_tx,
            shutdown_rx,
            tasks: Vec::new(),
        }
    }

    /// Start the node. Returns the address the listener is bound to.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Create the owned and replica directories
    /// 2. Register every file in the owned directory
    /// 3. Bind and spawn the listener
    /// 4. Spawn the lazy poller if the strategy polls
    pub async fn start(&mut self) -> Result<SocketAddr> {
        let id = self.peer.local_id().clone();
        let strategy = self.peer.strategy();
        info!("===========================================");
        info!("  Danutella peer {id}");
        info!("  Consistency: {}", strategy.mode());
        info!("===========================================");

        self.store
            .ensure_dirs()
            .await
            .context("Failed to create storage directories")?;
        self.peer
            .discover_owned_files()
            .await
            .context("Failed to list owned files")?;

        let listener = PeerListener::bind(
            (id.address(), id.port()),
            Arc::clone(&self.peer),
            self.peer.config().network.io_timeout,
        )
        .await
        .with_context(|| format!("Failed to listen on {id}"))?;
        let addr = listener
            .local_addr()
            .context("Failed to read listener address")?;
        self.tasks
            .push(tokio::spawn(listener.run(self.shutdown_rx.clone())));

        if let Some(interval) = strategy.poll_interval() {
            let poller = LazyPoller::new(Arc::clone(&self.peer), interval);
            self.tasks.push(poller.spawn(self.shutdown_rx.clone()));
        }

        info!(%addr, neighbors = self.peer.neighbors().len(), "Peer started");
        Ok(addr)
    }

    pub fn peer(&self) -> Arc<Peer> {
        Arc::clone(&self.peer)
    }

    /// Shutdown the node and wait for its tasks.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Task ended abnormally: {}", e);
            }
        }

        info!("Shutdown complete");
    }
}
