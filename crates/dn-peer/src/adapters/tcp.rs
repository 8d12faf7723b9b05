//! # TCP Peer Network
//!
//! Outbound port over TCP, one connection per call. Fire-and-forget messages
//! close the connection after writing; `poll` and `obtain` wait for one
//! response frame.

use async_trait::async_trait;
use shared_types::{ObtainedFile, PeerId, PeerMessage, PeerRequest, PeerResponse, PollResult};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::trace;

use super::codec::{map_io_error, read_frame, write_frame};
use crate::ports::{NetworkError, PeerNetwork};

/// [`PeerNetwork`] over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpPeerNetwork {
    timeout: Duration,
}

impl TcpPeerNetwork {
    /// `timeout` bounds each whole call, from connect to last byte.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn call(
        &self,
        to: &PeerId,
        request: PeerRequest,
    ) -> Result<Option<PeerResponse>, NetworkError> {
        let exchange = async {
            let mut stream = TcpStream::connect((to.address(), to.port()))
                .await
                .map_err(map_io_error)?;
            write_frame(&mut stream, &request).await?;

            if request.expects_response() {
                let response: PeerResponse = read_frame(&mut stream).await?;
                Ok(Some(response))
            } else {
                // The peer may already have hung up; the frame is written.
                let _ = stream.shutdown().await;
                Ok(None)
            }
        };

        let result = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| NetworkError::Timeout)?;
        trace!(to = %to, ok = result.is_ok(), "Call finished");
        result
    }
}

#[async_trait]
impl PeerNetwork for TcpPeerNetwork {
    async fn send(&self, to: &PeerId, message: PeerMessage) -> Result<(), NetworkError> {
        self.call(to, PeerRequest::Message(message)).await?;
        Ok(())
    }

    async fn poll(
        &self,
        to: &PeerId,
        version: u64,
        filename: &str,
    ) -> Result<PollResult, NetworkError> {
        let request = PeerRequest::Poll {
            version,
            filename: filename.to_string(),
        };
        match self.call(to, request).await? {
            Some(PeerResponse::Poll(result)) => Ok(result),
            Some(PeerResponse::Failure(reason)) => Err(NetworkError::Remote(reason)),
            other => Err(NetworkError::UnexpectedResponse(format!(
                "expected poll result, got {other:?}"
            ))),
        }
    }

    async fn obtain(&self, to: &PeerId, filename: &str) -> Result<ObtainedFile, NetworkError> {
        let request = PeerRequest::Obtain {
            filename: filename.to_string(),
        };
        match self.call(to, request).await? {
            Some(PeerResponse::Obtained(file)) => Ok(file),
            Some(PeerResponse::Failure(reason)) => Err(NetworkError::Remote(reason)),
            Some(PeerResponse::Poll(_)) | None => Err(NetworkError::UnexpectedResponse(
                "expected file, got poll result".to_string(),
            )),
        }
    }
}
