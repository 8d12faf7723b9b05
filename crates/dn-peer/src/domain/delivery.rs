//! Outcome of handling one inbound protocol message.

use std::fmt;

/// What a handler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was processed (and forwarded where applicable).
    Accepted,
    /// The message was filtered out.
    Dropped(DropReason),
}

impl Delivery {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Delivery::Accepted)
    }
}

/// Why a message was filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// This node created the message.
    OwnMessage,
    /// The id is already in the dedup cache.
    Duplicate,
    /// A hit for our own search that is no longer pending.
    NotRequested,
    /// No upstream mapping for a hit (evicted or never seen).
    NoUpstream,
    /// A hit arrived with no hops left.
    TtlExhausted,
    /// A wanted hit whose download could not complete.
    DownloadFailed,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DropReason::OwnMessage => "own message",
            DropReason::Duplicate => "duplicate",
            DropReason::NotRequested => "not requested",
            DropReason::NoUpstream => "no upstream",
            DropReason::TtlExhausted => "ttl exhausted",
            DropReason::DownloadFailed => "download failed",
        };
        f.write_str(reason)
    }
}
