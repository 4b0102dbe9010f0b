//! Event and ordering model.

use std::cmp::Ordering;
use std::fmt;
use tempo_types::{EntityId, EventSeq, SimTime};

/// Key for ordering events.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (creation order for the same time)
///
/// Sequence numbers are unique within a run, so no two distinct events
/// ever compare equal.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventKey {
    /// When this event fires.
    pub time: SimTime,
    /// Creation-order tie breaker.
    pub seq: EventSeq,
}

impl EventKey {
    /// Create a new event key.
    pub fn new(time: SimTime, seq: EventSeq) -> Self {
        Self { time, seq }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.seq.cmp(&other.seq)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.seq, self.time)
    }
}

/// A scheduled call into an entity.
///
/// Immutable once created. `P` is whatever the event loop needs to carry
/// out the call; the loop in `tempo-simulation` uses a boxed closure
/// holding the argument snapshot.
pub struct Event<P> {
    key: EventKey,
    target: EntityId,
    op: &'static str,
    payload: P,
}

impl<P> Event<P> {
    /// Create an event.
    pub fn new(key: EventKey, target: EntityId, op: &'static str, payload: P) -> Self {
        Self {
            key,
            target,
            op,
            payload,
        }
    }

    /// Ordering key.
    pub fn key(&self) -> EventKey {
        self.key
    }

    /// Fire time.
    pub fn time(&self) -> SimTime {
        self.key.time
    }

    /// Creation-order sequence number.
    pub fn seq(&self) -> EventSeq {
        self.key.seq
    }

    /// The entity that will process this event.
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Operation name, for diagnostics.
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consume the event, yielding its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P> fmt::Debug for Event<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.key.time)
            .field("seq", &self.key.seq)
            .field("target", &self.target)
            .field("op", &self.op)
            .finish_non_exhaustive()
    }
}

impl<P> PartialEq for Event<P> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<P> Eq for Event<P> {}

impl<P> Ord for Event<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl<P> PartialOrd for Event<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
