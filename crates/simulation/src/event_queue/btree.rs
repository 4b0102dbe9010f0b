//! Ordered-map backend.

use super::PendingEventSet;
use std::collections::BTreeMap;
use tempo_core::{Event, EventKey};

/// Events in a `BTreeMap` keyed by their ordering key.
///
/// Keys are unique, so the map never overwrites a pending event.
pub struct BTreeQueue<P> {
    events: BTreeMap<EventKey, Event<P>>,
}

impl<P> BTreeQueue<P> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
        }
    }
}

impl<P> Default for BTreeQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PendingEventSet<P> for BTreeQueue<P> {
    fn insert(&mut self, event: Event<P>) {
        let previous = self.events.insert(event.key(), event);
        debug_assert!(previous.is_none(), "duplicate event key");
    }

    fn peek_first(&self) -> Option<&Event<P>> {
        self.events.first_key_value().map(|(_, e)| e)
    }

    fn remove_first(&mut self) -> Option<Event<P>> {
        self.events.pop_first().map(|(_, e)| e)
    }

    fn len(&self) -> usize {
        self.events.len()
    }

    fn clear(&mut self) {
        self.events.clear();
    }
}
