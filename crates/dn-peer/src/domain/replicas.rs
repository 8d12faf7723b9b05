//! # Replica Table
//!
//! All records known to one node, keyed by filename, plus the rules for
//! merging a downloaded snapshot into it.

use super::entities::{Consistency, DanFile};
use shared_types::{PeerId, ReplicaSnapshot, Timestamp};
use std::collections::HashMap;
use std::fmt;

/// What merging a download did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No record existed; one was created.
    Inserted,
    /// An existing record was replaced in place.
    Updated,
    /// The local copy is the owner's; downloads never overwrite it.
    OwnedLocally,
    /// The snapshot is older than the local record of the same origin.
    Stale,
    /// Another download of the same file had not finished; this one was skipped.
    InFlight,
}

impl MergeOutcome {
    /// True if the downloaded bytes should be written to replica storage.
    pub fn accepts_bytes(&self) -> bool {
        matches!(self, MergeOutcome::Inserted | MergeOutcome::Updated)
    }
}

/// Files known to this node.
#[derive(Debug, Clone, Default)]
pub struct ReplicaTable {
    files: HashMap<String, DanFile>,
}

impl ReplicaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&DanFile> {
        self.files.get(filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut DanFile> {
        self.files.get_mut(filename)
    }

    /// Inserts `file`, replacing any record with the same name.
    pub fn insert(&mut self, file: DanFile) -> Option<DanFile> {
        self.files.insert(file.filename.clone(), file)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DanFile> {
        self.files.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DanFile> {
        self.files.values_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True if `local` has a servable copy of `filename` at `now`.
    /// Stores the recomputed TTR state.
    pub fn has_valid(&mut self, filename: &str, local: &PeerId, now: Timestamp) -> bool {
        self.files
            .get_mut(filename)
            .is_some_and(|file| file.is_valid(local, now))
    }

    /// Decides what a download of `snapshot` would do, without changing anything.
    pub fn classify(&self, local: &PeerId, snapshot: &ReplicaSnapshot) -> MergeOutcome {
        match self.files.get(&snapshot.filename) {
            None => MergeOutcome::Inserted,
            Some(file) if file.is_owned_by(local) => MergeOutcome::OwnedLocally,
            Some(file)
                if file.origin_server == snapshot.origin_server
                    && snapshot.version < file.version =>
            {
                MergeOutcome::Stale
            }
            Some(_) => MergeOutcome::Updated,
        }
    }

    /// Merges a downloaded snapshot. An existing entry is updated in place,
    /// otherwise a new one is inserted.
    pub fn merge_download(
        &mut self,
        local: &PeerId,
        snapshot: ReplicaSnapshot,
        now: Timestamp,
    ) -> MergeOutcome {
        let outcome = self.classify(local, &snapshot);
        match outcome {
            MergeOutcome::Inserted => {
                self.insert(DanFile::from_snapshot(snapshot, now));
            }
            MergeOutcome::Updated => {
                if let Some(file) = self.files.get_mut(&snapshot.filename) {
                    file.refresh_from(snapshot, now);
                }
            }
            MergeOutcome::OwnedLocally | MergeOutcome::Stale | MergeOutcome::InFlight => {}
        }
        outcome
    }

    /// Point-in-time listing as seen by `local`. Does not store TTR state.
    pub fn listing(&self, local: &PeerId, now: Timestamp) -> FileListing {
        let mut entries: Vec<ListingEntry> = self
            .files
            .values()
            .map(|file| ListingEntry {
                filename: file.filename.clone(),
                version: file.version,
                state: file.consistency_at(local, now),
                owned: file.is_owned_by(local),
            })
            .collect();
        entries.sort_by(|a, b| b.owned.cmp(&a.owned).then_with(|| a.filename.cmp(&b.filename)));
        FileListing { entries }
    }
}

/// One line of [`FileListing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub filename: String,
    pub version: u64,
    pub state: Consistency,
    pub owned: bool,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.owned { " +++ " } else { "   - " };
        write!(
            f,
            "{marker}{} : {{ version: {}; state: {} }}",
            self.filename, self.version, self.state
        )
    }
}

/// Owned files first, then replicas, each sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    pub entries: Vec<ListingEntry>,
}

impl FileListing {
    pub fn owned(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|entry| entry.owned)
    }

    pub fn replicas(&self) -> impl Iterator<Item = &ListingEntry> {
        self.entries.iter().filter(|entry| !entry.owned)
    }

    pub fn find(&self, filename: &str) -> Option<&ListingEntry> {
        self.entries.iter().find(|entry| entry.filename == filename)
    }
}

impl fmt::Display for FileListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
