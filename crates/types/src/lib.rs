//! Core types for the Tempo discrete-event simulator.
//!
//! These are the leaf types every other crate agrees on: virtual time,
//! entity identifiers and event sequence numbers. They carry no behaviour
//! beyond arithmetic and ordering.

mod identifiers;
mod time;

pub use identifiers::{EntityId, EventSeq};
pub use time::{SimTime, HOUR, MICROSECOND, MILLISECOND, MINUTE, NANOSECOND, SECOND};
