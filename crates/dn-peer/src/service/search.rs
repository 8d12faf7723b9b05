//! Flooding search: query propagation and hit back-tracing.

use shared_types::{MessageId, PeerId, PeerMessage};
use tracing::{debug, info, warn};

use super::PeerService;
use crate::domain::{Delivery, DropReason};
use crate::ports::{FileStore, PeerNetwork};

impl<N: PeerNetwork, F: FileStore> PeerService<N, F> {
    pub(crate) async fn handle_get(&self, filename: &str) -> MessageId {
        let message_id = {
            let mut state = self.state.lock();
            let id = state.next_message_id(&self.id);
            state.pending.insert(id.clone());
            id
        };

        let ttl = self.config.search.default_ttl;
        info!(filename, id = %message_id, ttl, "Searching");
        self.broadcast(PeerMessage::Query {
            upstream: self.id.clone(),
            message_id: message_id.clone(),
            ttl,
            filename: filename.to_string(),
        })
        .await;
        message_id
    }

    pub(crate) async fn handle_query(
        &self,
        upstream: PeerId,
        message_id: MessageId,
        ttl: u32,
        filename: String,
    ) -> Delivery {
        if message_id.is_from(&self.id) {
            debug!(id = %message_id, "Dropping own query");
            return Delivery::Dropped(DropReason::OwnMessage);
        }

        let has_copy = {
            let now = self.now();
            let mut state = self.state.lock();
            if !state.cache.record(message_id.clone(), Some(upstream.clone())) {
                debug!(id = %message_id, "Dropping duplicate query");
                return Delivery::Dropped(DropReason::Duplicate);
            }
            state.replicas.has_valid(&filename, &self.id, now)
        };

        // Hits start with a full hop budget so they can retrace any path
        // the query was able to take.
        let hit = has_copy.then(|| PeerMessage::HitQuery {
            message_id: message_id.clone(),
            ttl: self.config.search.default_ttl,
            filename: filename.clone(),
            source: self.id.clone(),
        });
        let forward = (ttl > 0).then(|| PeerMessage::Query {
            upstream: self.id.clone(),
            message_id: message_id.clone(),
            ttl: ttl - 1,
            filename: filename.clone(),
        });

        debug!(
            id = %message_id,
            %filename,
            ttl,
            hit = has_copy,
            forward = forward.is_some(),
            "Query accepted"
        );

        futures::join!(
            async {
                if let Some(hit) = hit {
                    self.deliver(&upstream, hit).await;
                }
            },
            async {
                if let Some(query) = forward {
                    self.broadcast(query).await;
                }
            },
        );
        Delivery::Accepted
    }

    pub(crate) async fn handle_hit_query(
        &self,
        message_id: MessageId,
        ttl: u32,
        filename: String,
        source: PeerId,
    ) -> Delivery {
        if message_id.is_from(&self.id) {
            return self.complete_search(message_id, filename, source).await;
        }

        let upstream = self.state.lock().cache.upstream_of(&message_id).cloned();
        let Some(upstream) = upstream else {
            debug!(id = %message_id, "Dropping hit with no upstream");
            return Delivery::Dropped(DropReason::NoUpstream);
        };
        if ttl == 0 {
            debug!(id = %message_id, "Dropping hit with no hops left");
            return Delivery::Dropped(DropReason::TtlExhausted);
        }

        debug!(id = %message_id, to = %upstream, "Back-tracing hit");
        self.deliver(
            &upstream,
            PeerMessage::HitQuery {
                message_id,
                ttl: ttl - 1,
                filename,
                source,
            },
        )
        .await;
        Delivery::Accepted
    }

    /// A hit for one of our own searches reached us.
    async fn complete_search(
        &self,
        message_id: MessageId,
        filename: String,
        source: PeerId,
    ) -> Delivery {
        let wanted = self.state.lock().pending.take(&message_id);
        if !wanted {
            debug!(id = %message_id, "Dropping hit for satisfied search");
            return Delivery::Dropped(DropReason::NotRequested);
        }

        info!(%filename, from = %source, "Hit received, downloading");
        match self.download(&source, &filename).await {
            Ok(outcome) => {
                info!(%filename, from = %source, ?outcome, "Download complete");
                Delivery::Accepted
            }
            Err(err) => {
                warn!(%filename, from = %source, error = %err, "Download failed");
                Delivery::Dropped(DropReason::DownloadFailed)
            }
        }
    }
}
