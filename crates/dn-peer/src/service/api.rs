use async_trait::async_trait;
use shared_types::{MessageId, ObtainedFile, PeerId, PollResult};

use super::PeerService;
use crate::domain::{Delivery, FileListing, PeerResult, PollReport, RefreshReport};
use crate::ports::{FileStore, PeerApi, PeerNetwork};

#[async_trait]
impl<N: PeerNetwork, F: FileStore> PeerApi for PeerService<N, F> {
    fn local_id(&self) -> &PeerId {
        &self.id
    }

    async fn get(&self, filename: &str) -> MessageId {
        self.handle_get(filename).await
    }

    async fn edit(&self, filename: &str) -> PeerResult<u64> {
        self.handle_edit(filename).await
    }

    fn list_files(&self) -> FileListing {
        self.handle_list_files()
    }

    async fn refresh(&self, filename: Option<&str>) -> RefreshReport {
        self.strategy.on_refresh(self, filename).await
    }

    async fn lazy_poll(&self) -> PollReport {
        self.handle_lazy_poll().await
    }

    async fn on_query(
        &self,
        upstream: PeerId,
        message_id: MessageId,
        ttl: u32,
        filename: String,
    ) -> Delivery {
        self.handle_query(upstream, message_id, ttl, filename).await
    }

    async fn on_hit_query(
        &self,
        message_id: MessageId,
        ttl: u32,
        filename: String,
        source: PeerId,
    ) -> Delivery {
        self.handle_hit_query(message_id, ttl, filename, source)
            .await
    }

    async fn on_invalidate(
        &self,
        message_id: MessageId,
        origin_server: PeerId,
        filename: String,
        version: u64,
    ) -> Delivery {
        self.handle_invalidate(message_id, origin_server, filename, version)
            .await
    }

    async fn on_poll(&self, version: u64, filename: &str) -> PeerResult<PollResult> {
        self.handle_poll(version, filename)
    }

    async fn on_obtain(&self, filename: &str) -> PeerResult<ObtainedFile> {
        self.handle_obtain(filename).await
    }
}
