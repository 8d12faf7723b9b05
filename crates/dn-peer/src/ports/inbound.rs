//! # Driving Port (Inbound API)
//!
//! Everything a node can be asked to do, by its user or by another peer.
//! The transport decodes a call and invokes the matching handler; the CLI
//! drives the user operations.

use async_trait::async_trait;
use shared_types::{
    MessageId, ObtainedFile, PeerId, PeerMessage, PeerRequest, PeerResponse, PollResult,
};

use crate::domain::{Delivery, FileListing, PeerResult, PollReport, RefreshReport};

/// Primary API of a peer.
#[async_trait]
pub trait PeerApi: Send + Sync {
    /// This node's identity.
    fn local_id(&self) -> &PeerId;

    // =========================================================================
    // User operations
    // =========================================================================

    /// Floods a search for `filename`. The hit, if any, is handled
    /// asynchronously by [`PeerApi::on_hit_query`].
    async fn get(&self, filename: &str) -> MessageId;

    /// Edits an owned file. Returns the new version.
    async fn edit(&self, filename: &str) -> PeerResult<u64>;

    /// Current view of every known file.
    fn list_files(&self) -> FileListing;

    /// Brings stale replicas up to date, all of them or just `filename`.
    async fn refresh(&self, filename: Option<&str>) -> RefreshReport;

    /// Polls the origin of every expired replica.
    async fn lazy_poll(&self) -> PollReport;

    // =========================================================================
    // Peer-to-peer handlers
    // =========================================================================

    async fn on_query(
        &self,
        upstream: PeerId,
        message_id: MessageId,
        ttl: u32,
        filename: String,
    ) -> Delivery;

    async fn on_hit_query(
        &self,
        message_id: MessageId,
        ttl: u32,
        filename: String,
        source: PeerId,
    ) -> Delivery;

    async fn on_invalidate(
        &self,
        message_id: MessageId,
        origin_server: PeerId,
        filename: String,
        version: u64,
    ) -> Delivery;

    /// Origin side of a freshness poll.
    async fn on_poll(&self, version: u64, filename: &str) -> PeerResult<PollResult>;

    /// Serves the bytes and record of a valid copy.
    async fn on_obtain(&self, filename: &str) -> PeerResult<ObtainedFile>;

    /// Routes a decoded protocol message to its handler.
    async fn on_message(&self, message: PeerMessage) -> Delivery {
        match message {
            PeerMessage::Query {
                upstream,
                message_id,
                ttl,
                filename,
            } => self.on_query(upstream, message_id, ttl, filename).await,
            PeerMessage::HitQuery {
                message_id,
                ttl,
                filename,
                source,
            } => self.on_hit_query(message_id, ttl, filename, source).await,
            PeerMessage::Invalidate {
                message_id,
                origin_server,
                filename,
                version,
            } => {
                self.on_invalidate(message_id, origin_server, filename, version)
                    .await
            }
        }
    }

    /// Routes any decoded call. Returns the response for request/response
    /// calls and `None` for fire-and-forget messages.
    async fn on_request(&self, request: PeerRequest) -> Option<PeerResponse> {
        match request {
            PeerRequest::Message(message) => {
                self.on_message(message).await;
                None
            }
            PeerRequest::Poll { version, filename } => Some(
                match self.on_poll(version, &filename).await {
                    Ok(result) => PeerResponse::Poll(result),
                    Err(err) => PeerResponse::Failure(err.to_string()),
                },
            ),
            PeerRequest::Obtain { filename } => Some(match self.on_obtain(&filename).await {
                Ok(file) => PeerResponse::Obtained(file),
                Err(err) => PeerResponse::Failure(err.to_string()),
            }),
        }
    }
}
