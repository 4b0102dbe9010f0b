//! Faults detected by the engine itself.
//!
//! Errors inside an entity's own logic are the entity's business. The
//! variants here are the ones the scheduler and event loop must surface.

use tempo_types::{EntityId, SimTime};
use thiserror::Error;

/// Errors raised by the discrete-event core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// An event was requested at a time the clock has already passed.
    #[error(
        "causality violation: {origin} scheduled `{op}` on {target} at {requested}, \
         but the clock is at {now}"
    )]
    CausalityViolation {
        /// Entity whose code made the request (system for the driver).
        origin: EntityId,
        /// Intended target.
        target: EntityId,
        /// Operation name.
        op: &'static str,
        /// Requested fire time.
        requested: SimTime,
        /// Clock when the request was made.
        now: SimTime,
    },

    /// A relative delay overflows virtual time.
    #[error("invalid delay: {delay} ticks after {now} overflows virtual time")]
    TimeOverflow {
        /// Clock when the request was made.
        now: SimTime,
        /// Requested delay in ticks.
        delay: u64,
    },

    /// The run has ended; nothing more may be scheduled or fired.
    #[error("simulation has ended")]
    Ended,

    /// The target entity is not registered (or has been retired).
    #[error("unknown entity {entity} for operation `{op}`")]
    UnknownEntity {
        /// Addressed entity.
        entity: EntityId,
        /// Operation name.
        op: &'static str,
    },

    /// The target exists but is not what the proxy addresses.
    #[error("{entity} does not provide the interface required by `{op}`")]
    CapabilityMismatch {
        /// Addressed entity.
        entity: EntityId,
        /// Operation name.
        op: &'static str,
    },

    /// Every entity id has been handed out.
    #[error("entity id space exhausted")]
    EntityLimit,
}

impl SimulationError {
    /// Whether this fault must abort the run when raised inside a handler.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SimulationError::CausalityViolation { .. }
                | SimulationError::TimeOverflow { .. }
                | SimulationError::Ended
        )
    }
}

/// Convenience alias for `Result<T, SimulationError>`.
pub type SimResult<T> = Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_causality_message_names_everything() {
        let e = SimulationError::CausalityViolation {
            origin: EntityId(2),
            target: EntityId(5),
            op: "receive",
            requested: SimTime(4),
            now: SimTime(5),
        };
        let s = e.to_string();
        assert!(s.contains("Entity(2)"));
        assert!(s.contains("Entity(5)"));
        assert!(s.contains("receive"));
        assert!(s.contains("0.000000004s"));
        assert!(s.contains("0.000000005s"));
    }

    #[test]
    fn test_fatality() {
        assert!(SimulationError::Ended.is_fatal());
        assert!(SimulationError::TimeOverflow {
            now: SimTime::MAX,
            delay: 1
        }
        .is_fatal());
        assert!(!SimulationError::UnknownEntity {
            entity: EntityId(3),
            op: "x"
        }
        .is_fatal());
        assert!(!SimulationError::EntityLimit.is_fatal());
    }

    #[test]
    fn test_is_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(SimulationError::Ended);
        assert_eq!(e.to_string(), "simulation has ended");
    }
}
