//! Simulator errors.

use tempo_core::{EntityId, SimulationError};
use thiserror::Error;

/// Failures while building or running a simulator.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("entity {0} is not registered")]
    MissingEntity(EntityId),

    #[error("failed to create latency histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
