//! # Core Entities
//!
//! Identity and time values used as keys across the network.
//!
//! - [`PeerId`]: `address:port` identity of a node
//! - [`MessageId`]: origin peer plus a per-peer sequence number
//! - [`Timestamp`]: wall-clock milliseconds since the Unix epoch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of a node in the network.
///
/// Peers never hold references to each other, only this key. The transport
/// layer resolves it to a connection.
///
/// # Example
///
/// ```rust
/// use shared_types::PeerId;
///
/// let peer = PeerId::new("localhost", 8001);
/// assert_eq!(peer.to_string(), "localhost:8001");
/// assert_eq!(peer, PeerId::localhost(8001));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId {
    address: String,
    port: u16,
}

impl PeerId {
    /// Address used when every peer runs on one machine.
    pub const DEFAULT_ADDRESS: &'static str = "localhost";

    /// Creates a peer identity from an address and port.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Creates a peer identity on [`Self::DEFAULT_ADDRESS`].
    pub fn localhost(port: u16) -> Self {
        Self::new(Self::DEFAULT_ADDRESS, port)
    }

    /// Host name or IP address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Listening port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Unique identifier of a flooded message.
///
/// Sequence numbers are allocated by the origin peer, strictly increasing and
/// never reused, so `(origin_peer, sequence_number)` is unique network-wide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    /// Peer that created the message.
    pub origin_peer: PeerId,
    /// Per-peer sequence number.
    pub sequence_number: u64,
}

impl MessageId {
    /// Creates a message identifier.
    pub fn new(origin_peer: PeerId, sequence_number: u64) -> Self {
        Self {
            origin_peer,
            sequence_number,
        }
    }

    /// Returns true if `peer` created this message.
    pub fn is_from(&self, peer: &PeerId) -> bool {
        &self.origin_peer == peer
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin_peer, self.sequence_number)
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Creates a timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Adds a duration, saturating at `u64::MAX` milliseconds.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
