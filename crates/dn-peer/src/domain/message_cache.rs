//! # Message Dedup Cache
//!
//! Bounded, insertion-ordered map from [`MessageId`] to the upstream peer the
//! message arrived from. It is the only thing that stops a flood from looping,
//! and it doubles as the reverse-path table for hit back-tracing.
//!
//! Search and invalidation share one instance, so a burst of one can evict
//! entries the other still needs.

use shared_types::{MessageId, PeerId};
use std::collections::{HashMap, VecDeque};

/// FIFO-evicting dedup cache.
///
/// Eviction follows insertion order only; lookups do not refresh an entry.
#[derive(Debug, Clone)]
pub struct MessageCache {
    capacity: usize,
    order: VecDeque<MessageId>,
    upstreams: HashMap<MessageId, Option<PeerId>>,
}

impl MessageCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            upstreams: HashMap::with_capacity(capacity),
        }
    }

    /// True if `id` is currently cached.
    pub fn seen(&self, id: &MessageId) -> bool {
        self.upstreams.contains_key(id)
    }

    /// Records `id` unless already present, evicting the oldest entry first
    /// when full. Returns `true` if the entry was inserted.
    pub fn record(&mut self, id: MessageId, upstream: Option<PeerId>) -> bool {
        if self.seen(&id) {
            return false;
        }

        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.upstreams.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(id.clone());
        self.upstreams.insert(id, upstream);
        true
    }

    /// Peer a cached message arrived from, if it is still cached and was not
    /// recorded without one.
    pub fn upstream_of(&self, id: &MessageId) -> Option<&PeerId> {
        self.upstreams.get(id).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
