//! Pending event set.
//!
//! The collection of not-yet-fired events for one run. Callers only see
//! the [`PendingEventSet`] contract; the backing structure is chosen per
//! run through [`QueueKind`] because the best choice depends on workload
//! shape (mostly near-term inserts versus events spread widely in time).

mod btree;
mod heap;
mod splay;

pub use btree::BTreeQueue;
pub use heap::HeapQueue;
pub use splay::SplayQueue;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tempo_core::Event;
use thiserror::Error;

/// Priority-queue contract for scheduled events.
///
/// Events are ordered by their [`EventKey`](tempo_core::EventKey), a strict
/// total order on `(time, sequence)`. An empty set is signalled by `None`,
/// never by a panic.
pub trait PendingEventSet<P> {
    /// Add an event.
    fn insert(&mut self, event: Event<P>);

    /// The minimum event, without removing it.
    fn peek_first(&self) -> Option<&Event<P>>;

    /// Remove and return the minimum event.
    fn remove_first(&mut self) -> Option<Event<P>>;

    /// Number of pending events.
    fn len(&self) -> usize;

    /// Whether no events are pending.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pending event.
    fn clear(&mut self);
}

/// Selects a pending-event-set backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    /// Binary min-heap. Good general default.
    #[default]
    Heap,
    /// Ordered B-tree map.
    BTree,
    /// Self-adjusting splay tree. Favors bursts of near-term inserts.
    Splay,
}

impl QueueKind {
    /// All backends, for sweeps and tests.
    pub const ALL: [QueueKind; 3] = [QueueKind::Heap, QueueKind::BTree, QueueKind::Splay];

    /// Build an empty queue of this kind.
    pub fn build<P>(self) -> AnyQueue<P> {
        match self {
            QueueKind::Heap => AnyQueue::Heap(HeapQueue::new()),
            QueueKind::BTree => AnyQueue::BTree(BTreeQueue::new()),
            QueueKind::Splay => AnyQueue::Splay(SplayQueue::new()),
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueKind::Heap => "heap",
            QueueKind::BTree => "btree",
            QueueKind::Splay => "splay",
        };
        f.write_str(name)
    }
}

/// Unrecognized queue name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown queue kind `{0}` (expected heap, btree or splay)")]
pub struct ParseQueueKindError(String);

impl FromStr for QueueKind {
    type Err = ParseQueueKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heap" => Ok(QueueKind::Heap),
            "btree" | "b-tree" => Ok(QueueKind::BTree),
            "splay" => Ok(QueueKind::Splay),
            _ => Err(ParseQueueKindError(s.to_string())),
        }
    }
}

/// A runtime-selected backend.
///
/// `Custom` accepts any other implementation of the contract.
pub enum AnyQueue<P> {
    Heap(HeapQueue<P>),
    BTree(BTreeQueue<P>),
    Splay(SplayQueue<P>),
    Custom(Box<dyn PendingEventSet<P>>),
}

impl<P> AnyQueue<P> {
    /// Name of the backend, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnyQueue::Heap(_) => "heap",
            AnyQueue::BTree(_) => "btree",
            AnyQueue::Splay(_) => "splay",
            AnyQueue::Custom(_) => "custom",
        }
    }

    fn as_dyn(&self) -> &dyn PendingEventSet<P> {
        match self {
            AnyQueue::Heap(q) => q,
            AnyQueue::BTree(q) => q,
            AnyQueue::Splay(q) => q,
            AnyQueue::Custom(q) => q.as_ref(),
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn PendingEventSet<P> {
        match self {
            AnyQueue::Heap(q) => q,
            AnyQueue::BTree(q) => q,
            AnyQueue::Splay(q) => q,
            AnyQueue::Custom(q) => q.as_mut(),
        }
    }
}

impl<P> PendingEventSet<P> for AnyQueue<P> {
    fn insert(&mut self, event: Event<P>) {
        self.as_dyn_mut().insert(event)
    }

    fn peek_first(&self) -> Option<&Event<P>> {
        self.as_dyn().peek_first()
    }

    fn remove_first(&mut self) -> Option<Event<P>> {
        self.as_dyn_mut().remove_first()
    }

    fn len(&self) -> usize {
        self.as_dyn().len()
    }

    fn clear(&mut self) {
        self.as_dyn_mut().clear()
    }
}

impl<P> fmt::Debug for AnyQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyQueue")
            .field("kind", &self.kind_name())
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_core::{EntityId, EventKey, EventSeq, SimTime};

    fn event(time: u64, seq: u64) -> Event<u64> {
        Event::new(
            EventKey::new(SimTime(time), EventSeq(seq)),
            EntityId(1),
            "test",
            seq,
        )
    }

    fn drain(queue: &mut dyn PendingEventSet<u64>) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        while let Some(e) = queue.remove_first() {
            out.push((e.time().as_nanos(), e.seq().0));
        }
        out
    }

    #[test]
    fn test_insertion_example_from_all_backends() {
        // Times [5,3,3,1,3] with sequence numbers in insertion order.
        for kind in QueueKind::ALL {
            let mut queue = kind.build::<u64>();
            for (seq, time) in [5, 3, 3, 1, 3].into_iter().enumerate() {
                queue.insert(event(time, seq as u64));
            }
            assert_eq!(queue.len(), 5, "{kind}");
            assert_eq!(
                drain(&mut queue),
                vec![(1, 3), (3, 1), (3, 2), (3, 4), (5, 0)],
                "{kind} removed out of order"
            );
        }
    }

    #[test]
    fn test_empty_signal() {
        for kind in QueueKind::ALL {
            let mut queue = kind.build::<u64>();
            assert!(queue.is_empty());
            assert!(queue.peek_first().is_none(), "{kind}");
            assert!(queue.remove_first().is_none(), "{kind}");
        }
    }

    #[test]
    fn test_peek_does_not_remove() {
        for kind in QueueKind::ALL {
            let mut queue = kind.build::<u64>();
            queue.insert(event(9, 0));
            queue.insert(event(4, 1));
            assert_eq!(queue.peek_first().map(|e| e.seq()), Some(EventSeq(1)));
            assert_eq!(queue.len(), 2, "{kind}");
            assert_eq!(queue.remove_first().map(|e| e.seq()), Some(EventSeq(1)));
            assert_eq!(queue.peek_first().map(|e| e.seq()), Some(EventSeq(0)));
        }
    }

    #[test]
    fn test_clear() {
        for kind in QueueKind::ALL {
            let mut queue = kind.build::<u64>();
            for i in 0..10 {
                queue.insert(event(i, i));
            }
            queue.clear();
            assert!(queue.is_empty(), "{kind}");
            queue.insert(event(2, 11));
            assert_eq!(queue.remove_first().map(|e| e.seq()), Some(EventSeq(11)));
        }
    }

    #[test]
    fn test_custom_backend() {
        let mut queue: AnyQueue<u64> = AnyQueue::Custom(Box::new(BTreeQueue::new()));
        queue.insert(event(3, 0));
        queue.insert(event(1, 1));
        assert_eq!(queue.kind_name(), "custom");
        assert_eq!(drain(&mut queue), vec![(1, 1), (3, 0)]);
    }

    #[test]
    fn test_queue_kind_parse_and_display() {
        for kind in QueueKind::ALL {
            assert_eq!(kind.to_string().parse::<QueueKind>(), Ok(kind));
        }
        assert_eq!("B-Tree".parse::<QueueKind>(), Ok(QueueKind::BTree));
        assert!("calendar".parse::<QueueKind>().is_err());
    }
}
