//! # Danutella Peer
//!
//! Protocol core of a Danutella node: a Gnutella-style flooding search over a
//! fixed neighbour graph, plus push or pull consistency for replicated,
//! versioned files.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** Replica records, dedup cache, pending searches
//! - **Ports Layer:** `PeerApi` (driving) and `PeerNetwork`, `FileStore`,
//!   `TimeSource` (driven)
//! - **Service Layer:** `PeerService`, the single owner of per-node state
//! - **Adapters Layer:** TCP transport, directory storage, TOML config
//!   (feature-gated)
//!
//! ## Features
//!
//! - `network` - TCP transport (bincode frames)
//! - `storage` - Directory-backed file store
//! - `config` - TOML config loading
//! - `test-utils` - Mock ports
//!
//! ## Example
//!
//! ```rust
//! use dn_peer::{MessageCache, MessageId, PeerId};
//!
//! let mut cache = MessageCache::new(2);
//! let origin = PeerId::localhost(8001);
//! for seq in 0..3 {
//!     cache.record(MessageId::new(origin.clone(), seq), None);
//! }
//! assert!(!cache.seen(&MessageId::new(origin.clone(), 0)));
//! assert!(cache.seen(&MessageId::new(origin, 2)));
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod config;
pub mod consistency;
pub mod domain;
pub mod poller;
pub mod ports;
pub mod service;

// =============================================================================
// FEATURE-GATED MODULES
// =============================================================================

/// Adapters for external integrations. The system clock is always built;
/// the rest depend on features.
pub mod adapters;

/// Test utilities (ManualTimeSource, MemoryFileStore, RecordingNetwork)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::{
    parse_peer_id, ConfigError, ConsistencyConfig, ConsistencyMode, IdentityConfig, NetworkConfig,
    NodeConfig, SearchConfig, StorageConfig,
};
pub use consistency::ConsistencyStrategy;
pub use domain::{
    derive_consistency, Consistency, DanFile, Delivery, DropReason, FileListing, ListingEntry,
    MergeOutcome, MessageCache, PeerError, PeerResult, PendingRequests, PollReport,
    RefreshReport, ReplicaTable,
};
pub use poller::LazyPoller;
pub use ports::{
    FileStore, Namespace, NetworkError, PeerApi, PeerNetwork, StoreError, TimeSource,
};
pub use service::PeerService;

pub use shared_types::{
    MessageId, ObtainedFile, PeerId, PeerMessage, PeerRequest, PeerResponse, PollResult,
    ReplicaSnapshot, Timestamp,
};
