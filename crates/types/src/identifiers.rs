//! Identifier types shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of a simulated entity within one run.
///
/// Ids are assigned in registration order and never reused by a
/// simulation, even across resets. Id `0` is reserved for the built-in
/// system entity, which owns one-shot callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The always-present system entity.
    pub const SYSTEM: Self = EntityId(0);

    /// Whether this is the system entity.
    pub fn is_system(self) -> bool {
        self == Self::SYSTEM
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system() {
            write!(f, "Entity(system)")
        } else {
            write!(f, "Entity({})", self.0)
        }
    }
}

/// Creation-order sequence number of an event.
///
/// Breaks ties between events scheduled for the same instant: the event
/// created first fires first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSeq(pub u64);

impl EventSeq {
    /// First sequence number of a run.
    pub const FIRST: Self = EventSeq(0);

    /// The following sequence number.
    pub fn next(self) -> Self {
        EventSeq(self.0 + 1)
    }
}

impl fmt::Display for EventSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_display() {
        assert_eq!(EntityId(4).to_string(), "Entity(4)");
        assert_eq!(EntityId::SYSTEM.to_string(), "Entity(system)");
    }

    #[test]
    fn test_seq_next() {
        assert_eq!(EventSeq::FIRST.next(), EventSeq(1));
        assert!(EventSeq(1) < EventSeq(2));
    }
}
