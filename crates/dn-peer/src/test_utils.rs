//! Test utilities for Danutella peers.
//!
//! Mock implementations of the outbound ports for deterministic testing.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use dn_peer::test_utils::ManualTimeSource;
//! use dn_peer::TimeSource;
//! use std::time::Duration;
//!
//! let clock = ManualTimeSource::new(1_000);
//! clock.advance(Duration::from_millis(500));
//! assert_eq!(clock.now().as_millis(), 1_500);
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ObtainedFile, PeerId, PeerMessage, PollResult, Timestamp};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::ports::{FileStore, Namespace, NetworkError, PeerNetwork, StoreError, TimeSource};

/// Thread-safe clock that only moves when told to.
#[derive(Debug)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(start_millis),
        }
    }

    /// Advances the clock by `by`.
    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, now: Timestamp) {
        self.millis.store(now.as_millis(), Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// In-memory [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<(Namespace, String), Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a file.
    pub fn with_file(self, namespace: Namespace, filename: &str, bytes: &[u8]) -> Self {
        self.put(namespace, filename, bytes);
        self
    }

    pub fn put(&self, namespace: Namespace, filename: &str, bytes: &[u8]) {
        self.files
            .lock()
            .insert((namespace, filename.to_string()), bytes.to_vec());
    }

    pub fn get(&self, namespace: Namespace, filename: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .get(&(namespace, filename.to_string()))
            .cloned()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read(&self, namespace: Namespace, filename: &str) -> Result<Vec<u8>, StoreError> {
        self.get(namespace, filename)
            .ok_or_else(|| StoreError::NotFound {
                namespace,
                filename: filename.to_string(),
            })
    }

    async fn write(
        &self,
        namespace: Namespace,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        self.put(namespace, filename, bytes);
        Ok(())
    }

    async fn list(&self, namespace: Namespace) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// A poll the service made through [`RecordingNetwork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPoll {
    pub to: PeerId,
    pub version: u64,
    pub filename: String,
}

/// [`PeerNetwork`] that records every call and answers from canned data.
#[derive(Debug, Default)]
pub struct RecordingNetwork {
    sent: Mutex<Vec<(PeerId, PeerMessage)>>,
    polls: Mutex<Vec<RecordedPoll>>,
    obtains: Mutex<Vec<(PeerId, String)>>,
    poll_responses: Mutex<HashMap<String, PollResult>>,
    remote_files: Mutex<HashMap<(PeerId, String), ObtainedFile>>,
    unreachable: Mutex<HashSet<PeerId>>,
}

impl RecordingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer polls for `filename` with `result`.
    pub fn set_poll_response(&self, filename: &str, result: PollResult) {
        self.poll_responses
            .lock()
            .insert(filename.to_string(), result);
    }

    /// Serve `file` from `peer` on `obtain`.
    pub fn add_remote_file(&self, peer: PeerId, file: ObtainedFile) {
        let filename = file.record.filename.clone();
        self.add_remote_file_as(peer, &filename, file);
    }

    /// Serve `file` from `peer` when `filename` is requested, whatever its record says.
    pub fn add_remote_file_as(&self, peer: PeerId, filename: &str, file: ObtainedFile) {
        self.remote_files
            .lock()
            .insert((peer, filename.to_string()), file);
    }

    /// Every call to `peer` fails with `ConnectionRefused`.
    pub fn set_unreachable(&self, peer: PeerId) {
        self.unreachable.lock().insert(peer);
    }

    pub fn sent(&self) -> Vec<(PeerId, PeerMessage)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, peer: &PeerId) -> Vec<PeerMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == peer)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Returns and clears the recorded sends.
    pub fn take_sent(&self) -> Vec<(PeerId, PeerMessage)> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn polls(&self) -> Vec<RecordedPoll> {
        self.polls.lock().clone()
    }

    /// `(source, filename)` of every download attempt.
    pub fn obtains(&self) -> Vec<(PeerId, String)> {
        self.obtains.lock().clone()
    }

    fn check_reachable(&self, peer: &PeerId) -> Result<(), NetworkError> {
        if self.unreachable.lock().contains(peer) {
            Err(NetworkError::ConnectionRefused)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PeerNetwork for RecordingNetwork {
    async fn send(&self, to: &PeerId, message: PeerMessage) -> Result<(), NetworkError> {
        self.check_reachable(to)?;
        self.sent.lock().push((to.clone(), message));
        Ok(())
    }

    async fn poll(
        &self,
        to: &PeerId,
        version: u64,
        filename: &str,
    ) -> Result<PollResult, NetworkError> {
        self.check_reachable(to)?;
        self.polls.lock().push(RecordedPoll {
            to: to.clone(),
            version,
            filename: filename.to_string(),
        });
        self.poll_responses
            .lock()
            .get(filename)
            .copied()
            .ok_or_else(|| NetworkError::Remote(format!("File not found: {filename}")))
    }

    async fn obtain(&self, to: &PeerId, filename: &str) -> Result<ObtainedFile, NetworkError> {
        self.check_reachable(to)?;
        self.obtains.lock().push((to.clone(), filename.to_string()));
        self.remote_files
            .lock()
            .get(&(to.clone(), filename.to_string()))
            .cloned()
            .ok_or_else(|| NetworkError::Remote(format!("File not found: {filename}")))
    }
}
