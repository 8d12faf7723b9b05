//! Pull consistency: serving polls as origin, and lazy polling as replica.

use futures::future::join_all;
use shared_types::{PeerId, PollResult};
use tracing::{debug, info, warn};

use super::PeerService;
use crate::domain::{PeerError, PeerResult, PollReport};
use crate::ports::{FileStore, PeerNetwork};

/// An expired replica selected for polling.
struct DuePoll {
    filename: String,
    version: u64,
    origin: PeerId,
}

impl<N: PeerNetwork, F: FileStore> PeerService<N, F> {
    pub(crate) fn handle_poll(&self, version: u64, filename: &str) -> PeerResult<PollResult> {
        let state = self.state.lock();
        let file = state
            .replicas
            .get(filename)
            .ok_or_else(|| PeerError::FileNotFound(filename.to_string()))?;
        if !file.is_owned_by(&self.id) {
            return Err(PeerError::NotOwner {
                filename: filename.to_string(),
            });
        }

        let result = if version < file.version {
            PollResult::out_of_date()
        } else {
            PollResult::fresh(self.config.consistency.default_ttr)
        };
        debug!(
            filename,
            theirs = version,
            ours = file.version,
            out_of_date = result.out_of_date,
            "Answered poll"
        );
        Ok(result)
    }

    pub(crate) async fn handle_lazy_poll(&self) -> PollReport {
        let due: Vec<DuePoll> = {
            let now = self.now();
            let mut state = self.state.lock();
            state
                .replicas
                .iter_mut()
                .filter(|file| !file.is_owned_by(&self.id))
                .filter_map(|file| file.is_expired(&self.id, now).then_some(file))
                .map(|file| DuePoll {
                    filename: file.filename.clone(),
                    version: file.version,
                    origin: file.origin_server.clone(),
                })
                .collect()
        };

        let mut report = PollReport::default();
        if due.is_empty() {
            return report;
        }

        let results = join_all(
            due.iter()
                .map(|poll| self.network.poll(&poll.origin, poll.version, &poll.filename)),
        )
        .await;

        let now = self.now();
        let mut state = self.state.lock();
        for (poll, result) in due.into_iter().zip(results) {
            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    warn!(filename = %poll.filename, origin = %poll.origin, error = %err, "Poll failed");
                    report.failed.push(poll.filename);
                    continue;
                }
            };

            // A download may have replaced the record while we were polling.
            let Some(file) = state.replicas.get_mut(&poll.filename) else {
                continue;
            };
            if file.version != poll.version || file.origin_server != poll.origin {
                continue;
            }

            if result.out_of_date {
                file.invalidate();
                info!(filename = %poll.filename, "Replica out of date");
                report.invalidated.push(poll.filename);
            } else {
                file.update_ttr(result.new_ttr, now);
                debug!(filename = %poll.filename, ttr = ?result.new_ttr, "Replica revalidated");
                report.revalidated.push(poll.filename);
            }
        }
        report
    }
}
