//! # Consistency Strategy
//!
//! Push and pull are one capability with two variants, chosen once at
//! start-up. The service calls into the strategy at its two decision points
//! (after an edit, and on a user refresh) and never branches on the mode
//! elsewhere.
//!
//! | Variant | After edit                  | On refresh                        |
//! |---------|-----------------------------|-----------------------------------|
//! | Push    | broadcast `invalidate`      | re-download INVALID replicas      |
//! | Pull    | nothing (replicas will poll)| poll expired, then re-download    |

use std::time::Duration;
use tracing::debug;

use crate::config::{ConsistencyConfig, ConsistencyMode};
use crate::domain::RefreshReport;
use crate::ports::{FileStore, PeerNetwork};
use crate::service::PeerService;

/// Replica consistency protocol of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyStrategy {
    Push,
    Pull {
        /// TTR this node hands out as an origin.
        default_ttr: Duration,
        /// Lazy-poll period.
        poll_interval: Duration,
    },
}

impl ConsistencyStrategy {
    pub fn from_config(config: &ConsistencyConfig) -> Self {
        match config.mode {
            ConsistencyMode::Push => ConsistencyStrategy::Push,
            ConsistencyMode::Pull => ConsistencyStrategy::Pull {
                default_ttr: config.default_ttr,
                poll_interval: config.poll_interval,
            },
        }
    }

    pub fn mode(&self) -> ConsistencyMode {
        match self {
            ConsistencyStrategy::Push => ConsistencyMode::Push,
            ConsistencyStrategy::Pull { .. } => ConsistencyMode::Pull,
        }
    }

    /// TTR stamped on owned records, and so on every replica served from them.
    /// Push replicas have no refresh deadline.
    pub fn advertised_ttr(&self) -> Option<Duration> {
        match self {
            ConsistencyStrategy::Push => None,
            ConsistencyStrategy::Pull { default_ttr, .. } => Some(*default_ttr),
        }
    }

    /// Lazy-poll period, if this strategy runs a poller.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            ConsistencyStrategy::Push => None,
            ConsistencyStrategy::Pull { poll_interval, .. } => Some(*poll_interval),
        }
    }

    /// Runs after the owner bumped `filename` to `version`.
    pub(crate) async fn on_edit<N, F>(&self, peer: &PeerService<N, F>, filename: &str, version: u64)
    where
        N: PeerNetwork,
        F: FileStore,
    {
        match self {
            ConsistencyStrategy::Push => peer.broadcast_invalidate(filename, version).await,
            ConsistencyStrategy::Pull { .. } => {
                debug!(filename, version, "Edit recorded; replicas will learn on next poll");
            }
        }
    }

    /// Brings stale replicas up to date, all of them or just `filename`.
    pub(crate) async fn on_refresh<N, F>(
        &self,
        peer: &PeerService<N, F>,
        filename: Option<&str>,
    ) -> RefreshReport
    where
        N: PeerNetwork,
        F: FileStore,
    {
        let poll = match self {
            ConsistencyStrategy::Push => Default::default(),
            ConsistencyStrategy::Pull { .. } => peer.handle_lazy_poll().await,
        };
        let (downloaded, failed) = peer.redownload_invalid(filename).await;
        RefreshReport {
            poll,
            downloaded,
            failed,
        }
    }
}
