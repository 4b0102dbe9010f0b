//! Deterministic discrete-event scheduling engine.
//!
//! This crate drives simulated entities forward in virtual time. Given the
//! same wiring and the same inputs, a run produces the same dispatch
//! order every time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Simulation                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Pending event set (heap / btree / splay)       │ │
//! │  │     Ordered by: time, then creation sequence       │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ remove minimum              │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     clock := event time; invoke target entity      │ │
//! │  │     entities: Vec<Box<dyn Entity>>                 │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ Context                     │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     proxy calls / sleeps → new events              │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities never call each other directly. A call through a
//! [`Proxy`](tempo_core::Proxy) becomes an event at the current instant
//! (or later); waiting is expressed by scheduling a continuation with
//! [`Context::sleep`] and returning.

mod config;
mod context;
mod event_queue;
mod kernel;
mod runner;
mod stats;

pub use config::{FaultPolicy, SimulationConfig};
pub use context::Context;
pub use event_queue::{
    AnyQueue, BTreeQueue, HeapQueue, ParseQueueKindError, PendingEventSet, QueueKind, SplayQueue,
};
pub use kernel::Invocation;
pub use runner::{EndReason, RunState, RunSummary, Simulation, StepOutcome, SystemEntity};
pub use stats::SimulationStats;
