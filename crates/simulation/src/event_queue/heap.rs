//! Binary-heap backend.

use super::PendingEventSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tempo_core::Event;

/// Min-heap of events.
///
/// `BinaryHeap` is a max-heap, so entries are wrapped in [`Reverse`].
pub struct HeapQueue<P> {
    heap: BinaryHeap<Reverse<Event<P>>>,
}

impl<P> HeapQueue<P> {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }
}

impl<P> Default for HeapQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PendingEventSet<P> for HeapQueue<P> {
    fn insert(&mut self, event: Event<P>) {
        self.heap.push(Reverse(event));
    }

    fn peek_first(&self) -> Option<&Event<P>> {
        self.heap.peek().map(|Reverse(e)| e)
    }

    fn remove_first(&mut self) -> Option<Event<P>> {
        self.heap.pop().map(|Reverse(e)| e)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
    }
}
