//! Searches this node issued and still awaits a hit for.

use shared_types::MessageId;
use std::collections::HashSet;

/// Set of outstanding search ids. Entries are removed only when a hit
/// arrives; unanswered searches stay forever.
#[derive(Debug, Clone, Default)]
pub struct PendingRequests {
    ids: HashSet<MessageId>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: MessageId) {
        self.ids.insert(id);
    }

    /// Removes `id`, returning `true` if it was pending.
    pub fn take(&mut self, id: &MessageId) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
