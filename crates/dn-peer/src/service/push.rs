//! Owner edits and push invalidation.

use shared_types::{MessageId, PeerId, PeerMessage};
use tracing::{debug, info};

use super::PeerService;
use crate::domain::{Delivery, DropReason, PeerError, PeerResult};
use crate::ports::{FileStore, PeerNetwork};

impl<N: PeerNetwork, F: FileStore> PeerService<N, F> {
    pub(crate) async fn handle_edit(&self, filename: &str) -> PeerResult<u64> {
        let version = {
            let now = self.now();
            let mut state = self.state.lock();
            let file = state
                .replicas
                .get_mut(filename)
                .ok_or_else(|| PeerError::FileNotFound(filename.to_string()))?;
            if !file.is_owned_by(&self.id) {
                return Err(PeerError::NotOwner {
                    filename: filename.to_string(),
                });
            }
            file.bump_version(now)
        };

        info!(filename, version, "File edited");
        self.strategy.on_edit(self, filename, version).await;
        Ok(version)
    }

    /// Floods an invalidation for a freshly edited owned file.
    pub(crate) async fn broadcast_invalidate(&self, filename: &str, version: u64) {
        let message_id = self.state.lock().next_message_id(&self.id);
        let reached = self
            .broadcast(PeerMessage::Invalidate {
                message_id,
                origin_server: self.id.clone(),
                filename: filename.to_string(),
                version,
            })
            .await;
        debug!(filename, version, reached, "Invalidation sent");
    }

    pub(crate) async fn handle_invalidate(
        &self,
        message_id: MessageId,
        origin_server: PeerId,
        filename: String,
        version: u64,
    ) -> Delivery {
        if message_id.is_from(&self.id) {
            debug!(id = %message_id, "Dropping own invalidation");
            return Delivery::Dropped(DropReason::OwnMessage);
        }

        let invalidated = {
            let mut state = self.state.lock();
            if !state.cache.record(message_id.clone(), None) {
                debug!(id = %message_id, "Dropping duplicate invalidation");
                return Delivery::Dropped(DropReason::Duplicate);
            }
            match state.replicas.get_mut(&filename) {
                Some(file)
                    if !file.is_owned_by(&self.id)
                        && file.origin_server == origin_server
                        && file.version < version =>
                {
                    file.invalidate();
                    true
                }
                _ => false,
            }
        };

        if invalidated {
            info!(%filename, version, origin = %origin_server, "Replica invalidated");
        }

        // No hop limit: the dedup cache alone ends the flood.
        self.broadcast(PeerMessage::Invalidate {
            message_id,
            origin_server,
            filename,
            version,
        })
        .await;
        Delivery::Accepted
    }
}
