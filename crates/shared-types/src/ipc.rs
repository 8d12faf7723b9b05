//! # Wire Messages
//!
//! Calls exchanged between peers. The transport encodes these as-is.
//!
//! | Call         | Kind             | Response          |
//! |--------------|------------------|-------------------|
//! | `query`      | fire-and-forget  | none              |
//! | `hitQuery`   | fire-and-forget  | none              |
//! | `invalidate` | fire-and-forget  | none              |
//! | `poll`       | request/response | [`PollResult`]    |
//! | `obtain`     | request/response | [`ObtainedFile`]  |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::entities::{MessageId, PeerId, Timestamp};

/// Flooded or back-traced protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerMessage {
    /// Search for `filename`, flooded to neighbours while `ttl > 0`.
    Query {
        /// Peer the receiver should send hits back to.
        upstream: PeerId,
        message_id: MessageId,
        ttl: u32,
        filename: String,
    },
    /// A hit travelling back along the reverse query path.
    HitQuery {
        message_id: MessageId,
        ttl: u32,
        filename: String,
        /// Peer holding a valid copy.
        source: PeerId,
    },
    /// Push-mode invalidation, flooded without a hop limit.
    Invalidate {
        message_id: MessageId,
        origin_server: PeerId,
        filename: String,
        version: u64,
    },
}

impl PeerMessage {
    /// Identifier of the underlying flooded message.
    pub fn message_id(&self) -> &MessageId {
        match self {
            PeerMessage::Query { message_id, .. }
            | PeerMessage::HitQuery { message_id, .. }
            | PeerMessage::Invalidate { message_id, .. } => message_id,
        }
    }

    /// Call name, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PeerMessage::Query { .. } => "query",
            PeerMessage::HitQuery { .. } => "hitQuery",
            PeerMessage::Invalidate { .. } => "invalidate",
        }
    }
}

/// Origin's answer to a freshness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    /// True if the caller's version is behind the origin's.
    pub out_of_date: bool,
    /// Time-to-refresh the caller should adopt when still current.
    pub new_ttr: Duration,
}

impl PollResult {
    /// Caller is behind; its copy must be invalidated.
    pub fn out_of_date() -> Self {
        Self {
            out_of_date: true,
            new_ttr: Duration::ZERO,
        }
    }

    /// Caller is current and may keep serving for `ttr`.
    pub fn fresh(ttr: Duration) -> Self {
        Self {
            out_of_date: false,
            new_ttr: ttr,
        }
    }
}

/// Replica metadata sent along with the bytes of an `obtain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSnapshot {
    pub filename: String,
    pub version: u64,
    pub origin_server: PeerId,
    pub last_modified_time: Timestamp,
    /// Refresh deadline the origin advertises. `None` under push consistency.
    pub ttr: Option<Duration>,
}

/// A downloaded file: metadata snapshot plus content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObtainedFile {
    pub record: ReplicaSnapshot,
    pub bytes: Vec<u8>,
}

/// Any call one peer can make on another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRequest {
    Message(PeerMessage),
    Poll { version: u64, filename: String },
    Obtain { filename: String },
}

impl PeerRequest {
    /// True if the caller waits for a [`PeerResponse`].
    pub fn expects_response(&self) -> bool {
        !matches!(self, PeerRequest::Message(_))
    }
}

/// Reply to a request/response call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerResponse {
    Poll(PollResult),
    Obtained(ObtainedFile),
    /// The callee could not satisfy the request (unknown file, not owner, I/O).
    Failure(String),
}
