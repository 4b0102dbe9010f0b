//! Configuration types for the simulator.

use crate::error::SimulatorError;
use serde::{Deserialize, Serialize};
use tempo_core::SimTime;
use tempo_simulation::{QueueKind, SimulationConfig};
use tempo_types::{MICROSECOND, MILLISECOND};

/// Configuration for a beacon network run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Number of beacon nodes sharing the channel.
    pub nodes: u32,

    /// Idle time between a node's beacons, in ticks.
    pub beacon_interval: u64,

    /// Upper bound of the random backoff before each beacon, in ticks.
    pub max_backoff: u64,

    /// Time a frame occupies the air, in ticks.
    pub airtime: u64,

    /// Channel parameters.
    pub channel: ChannelConfig,

    /// Virtual time at which the run stops.
    pub duration: SimTime,

    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Pending-event-set backend.
    pub queue: QueueKind,
}

impl SimulatorConfig {
    /// Create a configuration for `nodes` beacon nodes.
    pub fn new(nodes: u32) -> Self {
        Self {
            nodes,
            beacon_interval: 100 * MILLISECOND,
            max_backoff: 10 * MILLISECOND,
            airtime: 500 * MICROSECOND,
            channel: ChannelConfig::default(),
            duration: SimTime::from_secs(10),
            seed: 12345,
            queue: QueueKind::default(),
        }
    }

    /// Set the beacon interval.
    pub fn with_beacon_interval(mut self, interval: u64) -> Self {
        self.beacon_interval = interval;
        self
    }

    /// Set the maximum random backoff.
    pub fn with_max_backoff(mut self, backoff: u64) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Set the frame airtime.
    pub fn with_airtime(mut self, airtime: u64) -> Self {
        self.airtime = airtime;
        self
    }

    /// Set the channel parameters.
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// Set the run length.
    pub fn with_duration(mut self, duration: SimTime) -> Self {
        self.duration = duration;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the queue backend.
    pub fn with_queue(mut self, queue: QueueKind) -> Self {
        self.queue = queue;
        self
    }

    /// Reject configurations the models cannot run.
    pub fn validate(&self) -> Result<(), SimulatorError> {
        if self.nodes == 0 {
            return Err(SimulatorError::InvalidConfig(
                "at least one node is required".into(),
            ));
        }
        if self.beacon_interval == 0 {
            return Err(SimulatorError::InvalidConfig(
                "beacon interval must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.channel.loss) {
            return Err(SimulatorError::InvalidConfig(format!(
                "loss probability {} is outside [0, 1]",
                self.channel.loss
            )));
        }
        Ok(())
    }

    /// Convert to a configuration for the underlying engine.
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig::default()
            .with_end_time(self.duration)
            .with_queue(self.queue)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Propagation model of the shared channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Base propagation delay, in ticks.
    pub latency: u64,

    /// Maximum extra delay added per delivery, in ticks.
    pub jitter: u64,

    /// Probability that a single delivery is lost.
    pub loss: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            latency: 2 * MILLISECOND,
            jitter: 500 * MICROSECOND,
            loss: 0.0,
        }
    }
}

impl ChannelConfig {
    /// Set the base latency.
    pub fn with_latency(mut self, latency: u64) -> Self {
        self.latency = latency;
        self
    }

    /// Set the jitter bound.
    pub fn with_jitter(mut self, jitter: u64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the loss probability.
    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = loss;
        self
    }
}
