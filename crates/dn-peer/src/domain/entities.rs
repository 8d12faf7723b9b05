//! # Replica Records
//!
//! A [`DanFile`] is one node's view of a shared file. The owner's copy and a
//! downloaded replica use the same record; ownership is decided by comparing
//! `origin_server` to the local peer.

use shared_types::{PeerId, ReplicaSnapshot, Timestamp};
use std::fmt;
use std::time::Duration;

/// Consistency state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    /// May be served to searchers.
    Valid,
    /// A newer version exists at the origin.
    Invalid,
    /// Refresh deadline passed; must be re-validated by a poll.
    TtrExpired,
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consistency::Valid => write!(f, "VALID"),
            Consistency::Invalid => write!(f, "INVALID"),
            Consistency::TtrExpired => write!(f, "TTR_EXPIRED"),
        }
    }
}

/// Derives the effective consistency of a record at `now`.
///
/// Owned copies and records without a TTR keep their stored state. A stored
/// `Valid` becomes `TtrExpired` once `now >= last_polled + ttr`.
pub fn derive_consistency(
    stored: Consistency,
    owned: bool,
    now: Timestamp,
    last_polled: Timestamp,
    ttr: Option<Duration>,
) -> Consistency {
    match (stored, owned, ttr) {
        (Consistency::Valid, false, Some(ttr)) if now >= last_polled.saturating_add(ttr) => {
            Consistency::TtrExpired
        }
        _ => stored,
    }
}

/// Per-node record of a shared, versioned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanFile {
    pub filename: String,
    /// Never decreases for a given `(filename, origin_server)` at one node.
    pub version: u64,
    pub origin_server: PeerId,
    consistency: Consistency,
    pub last_modified_time: Timestamp,
    pub last_polled_time: Timestamp,
    /// `None` means the record has no refresh deadline.
    pub ttr: Option<Duration>,
}

impl DanFile {
    /// Creates the owner's record for a file discovered on local disk.
    pub fn owned(
        filename: impl Into<String>,
        origin_server: PeerId,
        now: Timestamp,
        ttr: Option<Duration>,
    ) -> Self {
        Self {
            filename: filename.into(),
            version: 0,
            origin_server,
            consistency: Consistency::Valid,
            last_modified_time: now,
            last_polled_time: now,
            ttr,
        }
    }

    /// Creates a replica record from a downloaded snapshot.
    pub fn from_snapshot(snapshot: ReplicaSnapshot, now: Timestamp) -> Self {
        Self {
            filename: snapshot.filename,
            version: snapshot.version,
            origin_server: snapshot.origin_server,
            consistency: Consistency::Valid,
            last_modified_time: snapshot.last_modified_time,
            last_polled_time: now,
            ttr: snapshot.ttr,
        }
    }

    /// Metadata to send along with the bytes when serving this file.
    pub fn snapshot(&self) -> ReplicaSnapshot {
        ReplicaSnapshot {
            filename: self.filename.clone(),
            version: self.version,
            origin_server: self.origin_server.clone(),
            last_modified_time: self.last_modified_time,
            ttr: self.ttr,
        }
    }

    /// True if `peer` is the origin of this file.
    pub fn is_owned_by(&self, peer: &PeerId) -> bool {
        &self.origin_server == peer
    }

    /// Stored state, without applying the TTR deadline.
    pub fn stored_consistency(&self) -> Consistency {
        self.consistency
    }

    /// Effective state at `now` as seen by `local`. Does not mutate.
    pub fn consistency_at(&self, local: &PeerId, now: Timestamp) -> Consistency {
        derive_consistency(
            self.consistency,
            self.is_owned_by(local),
            now,
            self.last_polled_time,
            self.ttr,
        )
    }

    /// Recomputes the TTR state and stores the result.
    pub fn check_ttr(&mut self, local: &PeerId, now: Timestamp) -> Consistency {
        self.consistency = self.consistency_at(local, now);
        self.consistency
    }

    /// True if the file may be served at `now`.
    pub fn is_valid(&mut self, local: &PeerId, now: Timestamp) -> bool {
        self.check_ttr(local, now) == Consistency::Valid
    }

    /// True if the record needs a poll at `now`.
    pub fn is_expired(&mut self, local: &PeerId, now: Timestamp) -> bool {
        self.check_ttr(local, now) == Consistency::TtrExpired
    }

    pub fn invalidate(&mut self) {
        self.consistency = Consistency::Invalid;
    }

    /// Adopts a new refresh deadline starting at `now` and re-validates.
    pub fn update_ttr(&mut self, ttr: Duration, now: Timestamp) {
        self.last_polled_time = now;
        self.ttr = Some(ttr);
        self.consistency = Consistency::Valid;
    }

    /// Owner edit: next version, modified at `now`. Returns the new version.
    pub fn bump_version(&mut self, now: Timestamp) -> u64 {
        self.version = self.version.saturating_add(1);
        self.last_modified_time = now;
        self.consistency = Consistency::Valid;
        self.version
    }

    /// Replaces the record in place with a freshly downloaded snapshot.
    pub fn refresh_from(&mut self, snapshot: ReplicaSnapshot, now: Timestamp) {
        self.version = snapshot.version;
        self.origin_server = snapshot.origin_server;
        self.last_modified_time = snapshot.last_modified_time;
        self.last_polled_time = now;
        self.ttr = snapshot.ttr;
        self.consistency = Consistency::Valid;
    }
}
