//! # Peer Listener
//!
//! Inbound side of the TCP transport. Each accepted connection carries one
//! call and is served on its own task, so handlers run concurrently.

use shared_types::PeerRequest;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::codec::{read_frame, write_frame};
use crate::ports::{NetworkError, PeerApi};

/// Accept loop dispatching decoded calls to a [`PeerApi`].
pub struct PeerListener<S: PeerApi + ?Sized> {
    listener: TcpListener,
    peer: Arc<S>,
    timeout: Duration,
}

impl<S: PeerApi + ?Sized + 'static> PeerListener<S> {
    /// Binds `addr`. `timeout` bounds reading the request of one connection.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        peer: Arc<S>,
        timeout: Duration,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener, peer, timeout))
    }

    /// Wraps an already bound listener.
    pub fn new(listener: TcpListener, peer: Arc<S>, timeout: Duration) -> Self {
        Self {
            listener,
            peer,
            timeout,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` turns `true` or its sender is dropped.
    /// In-flight handlers are left to finish on their own.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(peer = %self.peer.local_id(), addr = ?self.listener.local_addr().ok(), "Listening");
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let peer = Arc::clone(&self.peer);
                        let timeout = self.timeout;
                        tokio::spawn(async move {
                            if let Err(err) = serve_connection(peer, stream, timeout).await {
                                debug!(%remote, error = %err, "Connection failed");
                            }
                        });
                    }
                    Err(err) => warn!(error = %err, "Accept failed"),
                },
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                }
            }
        }
        info!(peer = %self.peer.local_id(), "Listener stopped");
    }
}

async fn serve_connection<S: PeerApi + ?Sized>(
    peer: Arc<S>,
    mut stream: TcpStream,
    timeout: Duration,
) -> Result<(), NetworkError> {
    let request: PeerRequest = tokio::time::timeout(timeout, read_frame(&mut stream))
        .await
        .map_err(|_| NetworkError::Timeout)??;

    if let Some(response) = peer.on_request(request).await {
        write_frame(&mut stream, &response).await?;
    }
    Ok(())
}
