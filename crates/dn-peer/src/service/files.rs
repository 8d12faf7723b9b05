//! Serving, downloading and listing files.

use futures::future::join_all;
use parking_lot::Mutex;
use shared_types::{ObtainedFile, PeerId};
use tracing::{debug, warn};

use super::core::PeerState;
use super::PeerService;
use crate::domain::{Consistency, FileListing, MergeOutcome, PeerError, PeerResult};
use crate::ports::{FileStore, Namespace, NetworkError, PeerNetwork};

/// Claim on a filename in [`PeerState::downloading`], released on drop.
struct DownloadSlot<'a> {
    state: &'a Mutex<PeerState>,
    filename: &'a str,
}

impl Drop for DownloadSlot<'_> {
    fn drop(&mut self) {
        self.state.lock().downloading.remove(self.filename);
    }
}

impl<N: PeerNetwork, F: FileStore> PeerService<N, F> {
    pub(crate) async fn handle_obtain(&self, filename: &str) -> PeerResult<ObtainedFile> {
        let (record, namespace) = {
            let now = self.now();
            let mut state = self.state.lock();
            let file = state
                .replicas
                .get_mut(filename)
                .ok_or_else(|| PeerError::FileNotFound(filename.to_string()))?;
            if !file.is_valid(&self.id, now) {
                return Err(PeerError::NotServable(filename.to_string()));
            }
            let namespace = if file.is_owned_by(&self.id) {
                Namespace::Owned
            } else {
                Namespace::Replica
            };
            (file.snapshot(), namespace)
        };

        let bytes = self.store.read(namespace, filename).await?;
        debug!(filename, version = record.version, size = bytes.len(), "Serving file");
        Ok(ObtainedFile { record, bytes })
    }

    /// Fetches `filename` from `source` and merges it into the table.
    ///
    /// Bytes are written only if the merge will accept the record. At most
    /// one download per filename is between classify and merge at a time;
    /// a second one returns [`MergeOutcome::InFlight`] without writing.
    pub(crate) async fn download(
        &self,
        source: &PeerId,
        filename: &str,
    ) -> PeerResult<MergeOutcome> {
        let ObtainedFile { record, bytes } = self.network.obtain(source, filename).await?;
        if record.filename != filename {
            return Err(NetworkError::UnexpectedResponse(format!(
                "asked for {filename}, got {}",
                record.filename
            ))
            .into());
        }

        let (outcome, _slot) = {
            let mut state = self.state.lock();
            if state.downloading.contains(filename) {
                (MergeOutcome::InFlight, None)
            } else {
                let outcome = state.replicas.classify(&self.id, &record);
                let slot = outcome.accepts_bytes().then(|| {
                    state.downloading.insert(filename.to_string());
                    DownloadSlot {
                        state: &self.state,
                        filename,
                    }
                });
                (outcome, slot)
            }
        };
        if !outcome.accepts_bytes() {
            debug!(filename, ?outcome, "Download not merged");
            return Ok(outcome);
        }

        self.store.write(Namespace::Replica, filename, &bytes).await?;

        let now = self.now();
        let outcome = self
            .state
            .lock()
            .replicas
            .merge_download(&self.id, record, now);
        Ok(outcome)
    }

    /// Re-downloads INVALID replicas from their origin.
    /// Returns `(refreshed, failed)` filenames.
    pub(crate) async fn redownload_invalid(
        &self,
        filename: Option<&str>,
    ) -> (Vec<String>, Vec<String>) {
        let targets: Vec<(String, PeerId)> = {
            let state = self.state.lock();
            state
                .replicas
                .iter()
                .filter(|file| filename.map_or(true, |name| file.filename == name))
                .filter(|file| !file.is_owned_by(&self.id))
                .filter(|file| file.stored_consistency() == Consistency::Invalid)
                .map(|file| (file.filename.clone(), file.origin_server.clone()))
                .collect()
        };

        let results = join_all(
            targets
                .iter()
                .map(|(name, origin)| self.download(origin, name)),
        )
        .await;

        let mut refreshed = Vec::new();
        let mut failed = Vec::new();
        for ((name, origin), result) in targets.into_iter().zip(results) {
            match result {
                Ok(outcome) if outcome.accepts_bytes() => refreshed.push(name),
                Ok(outcome) => {
                    warn!(filename = %name, ?outcome, "Refresh not merged");
                    failed.push(name);
                }
                Err(err) => {
                    warn!(filename = %name, origin = %origin, error = %err, "Refresh failed");
                    failed.push(name);
                }
            }
        }
        (refreshed, failed)
    }

    pub(crate) fn handle_list_files(&self) -> FileListing {
        let now = self.now();
        self.state.lock().replicas.listing(&self.id, now)
    }
}
