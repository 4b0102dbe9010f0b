//! Tempo Simulator
//!
//! Example protocol models built on the `tempo-simulation` engine, plus
//! a harness for running them.
//!
//! # Architecture
//!
//! - **Channel**: shared broadcast medium with latency, jitter and loss
//! - **Beacon nodes**: periodic broadcasters reached through two
//!   capability interfaces ([`NetHandler`], [`AppInterface`])
//! - **Metrics**: latency histogram finalized by an end-of-run hook
//! - **Workloads**: seeded timer schedules for ordering checks and queue
//!   benchmarks
//!
//! # Example
//!
//! ```ignore
//! use tempo_simulator::{Simulator, SimulatorConfig};
//! use tempo_core::SimTime;
//!
//! let config = SimulatorConfig::new(16)
//!     .with_duration(SimTime::from_secs(30))
//!     .with_seed(42);
//!
//! let report = Simulator::new(config)?.run()?;
//! report.print_summary();
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod node;
pub mod runner;
pub mod workload;

pub use channel::{Channel, ChannelStats, Frame};
pub use config::{ChannelConfig, SimulatorConfig};
pub use error::SimulatorError;
pub use metrics::{LatencySummary, SimulationReport, StatsCollector};
pub use node::{AppInterface, BeaconNode, BeaconState, BeaconTiming, NetHandler, NodeStats};
pub use runner::{run_sweep, run_uniform, Simulator, UniformReport};
pub use workload::{TimerSink, UniformWorkload, WorkloadGenerator};
