//! # Lazy Poller
//!
//! Background task of a pull-mode node. Every `interval` it asks the peer to
//! poll the origins of its expired replicas, until the shutdown signal fires.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::ports::PeerApi;

/// Periodic `lazy_poll` driver.
pub struct LazyPoller<S: PeerApi + ?Sized> {
    peer: Arc<S>,
    interval: Duration,
}

impl<S: PeerApi + ?Sized + 'static> LazyPoller<S> {
    pub fn new(peer: Arc<S>, interval: Duration) -> Self {
        Self { peer, interval }
    }

    /// Runs until `shutdown` turns `true` or its sender is dropped.
    /// The first pass happens one full interval after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(peer = %self.peer.local_id(), ?period, "Lazy poller started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.peer.lazy_poll().await;
                    if report.is_empty() {
                        debug!("Lazy poll: nothing expired");
                    } else {
                        info!(
                            polled = report.polled(),
                            revalidated = report.revalidated.len(),
                            invalidated = report.invalidated.len(),
                            failed = report.failed.len(),
                            "Lazy poll complete"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    let stop = changed.is_err() || *shutdown.borrow();
                    if stop {
                        break;
                    }
                }
            }
        }
        info!(peer = %self.peer.local_id(), "Lazy poller stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
