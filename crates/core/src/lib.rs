//! Core types for the Tempo discrete-event engine.
//!
//! This crate defines the vocabulary shared by the scheduler, the event
//! loop and every simulated component:
//!
//! - [`EventKey`] / [`Event`]: a unit of scheduled work and its strict
//!   `(time, sequence)` total order
//! - [`Entity`]: a simulated component, reachable only through events
//! - [`Proxy`]: a typed handle used to address an entity, optionally
//!   under one of several capability traits it implements
//! - [`SimulationError`]: the faults the core itself detects
//!
//! The event loop that drives these types lives in `tempo-simulation`.

mod error;
mod event;
mod proxy;
mod traits;

pub use error::{SimResult, SimulationError};
pub use event::{Event, EventKey};
pub use proxy::Proxy;
pub use traits::{AsAny, Capability, Entity};

pub use tempo_types::{EntityId, EventSeq, SimTime};
