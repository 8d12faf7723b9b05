//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the host supplies: the channel to other peers, local file
//! storage, and a clock.

use async_trait::async_trait;
use shared_types::{ObtainedFile, PeerId, PeerMessage, PollResult, Timestamp};
use std::fmt;
use thiserror::Error;

/// Channel to other peers.
///
/// `send` is fire-and-forget: a returned error only means the message was
/// lost, and callers log it and move on. `poll` and `obtain` wait for the
/// remote answer.
///
/// Implementations must be `Send + Sync`; the service calls them
/// concurrently from many tasks.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Deliver a `query`, `hitQuery` or `invalidate` to `to`.
    async fn send(&self, to: &PeerId, message: PeerMessage) -> Result<(), NetworkError>;

    /// Ask the origin `to` whether `version` of `filename` is current.
    async fn poll(
        &self,
        to: &PeerId,
        version: u64,
        filename: &str,
    ) -> Result<PollResult, NetworkError>;

    /// Download `filename` and its record snapshot from `to`.
    async fn obtain(&self, to: &PeerId, filename: &str) -> Result<ObtainedFile, NetworkError>;
}

/// Errors from calls to other peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The call did not complete in time
    #[error("network operation timed out")]
    Timeout,
    /// Nobody is listening at the peer's address
    #[error("connection refused by peer")]
    ConnectionRefused,
    /// Socket-level failure
    #[error("i/o error: {0}")]
    Io(String),
    /// A frame could not be encoded or decoded
    #[error("codec error: {0}")]
    Codec(String),
    /// The peer answered with the wrong kind of response
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    /// The peer answered but could not satisfy the request
    #[error("peer rejected request: {0}")]
    Remote(String),
}

/// The two storage areas of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Files this node is origin for.
    Owned,
    /// Files downloaded from other nodes.
    Replica,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Owned => write!(f, "owned"),
            Namespace::Replica => write!(f, "replica"),
        }
    }
}

/// Named byte blobs in two namespaces.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn read(&self, namespace: Namespace, filename: &str) -> Result<Vec<u8>, StoreError>;

    async fn write(
        &self,
        namespace: Namespace,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError>;

    /// Names of all files in `namespace`.
    async fn list(&self, namespace: Namespace) -> Result<Vec<String>, StoreError>;
}

/// Errors from local storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such file in {namespace} storage: {filename}")]
    NotFound {
        namespace: Namespace,
        filename: String,
    },

    /// Names must be a single path component.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract interface for time-related operations.
///
/// Enables deterministic TTR tests by injecting a controllable clock.
pub trait TimeSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}
