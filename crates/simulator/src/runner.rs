//! Simulator runner: wires the beacon network onto the engine.

use crate::channel::Channel;
use crate::config::SimulatorConfig;
use crate::error::SimulatorError;
use crate::metrics::{SimulationReport, StatsCollector};
use crate::node::{AppInterface, BeaconNode, BeaconTiming, NetHandler};
use crate::workload::{self, TimerSink, UniformWorkload, WorkloadGenerator};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tempo_core::{Proxy, SimTime};
use tempo_simulation::{EndReason, QueueKind, Simulation, SimulationConfig, SimulationStats};
use tracing::{debug, info};

/// A beacon network ready to run.
///
/// Every node is started at time zero through its [`AppInterface`]; all
/// randomness derives from `config.seed`.
pub struct Simulator {
    config: SimulatorConfig,
    sim: Simulation,
    channel: Proxy<Channel>,
    collector: Proxy<StatsCollector>,
    nodes: Vec<Proxy<BeaconNode>>,
}

impl Simulator {
    /// Build the network described by `config`.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut sim = Simulation::new(config.to_simulation_config());

        let collector = sim.register(StatsCollector::new()?)?;
        let channel = sim.register(Channel::new(config.channel, rng.gen()))?;

        let timing = BeaconTiming {
            interval: config.beacon_interval,
            max_backoff: config.max_backoff,
            airtime: config.airtime,
        };
        let mut nodes = Vec::with_capacity(config.nodes as usize);
        for _ in 0..config.nodes {
            let node = sim.register(BeaconNode::new(channel, collector, timing, rng.gen()))?;
            sim.entity_mut(&channel)
                .ok_or(SimulatorError::MissingEntity(channel.id()))?
                .attach(node.capability::<dyn NetHandler>());
            nodes.push(node);
        }

        for node in &nodes {
            let app: Proxy<dyn AppInterface> = node.capability();
            sim.call(&app, "start", |app, ctx| app.start(ctx))?;
        }
        sim.at_end(&collector, "finalize", |collector, ctx| collector.finalize(ctx))?;

        info!(
            nodes = config.nodes,
            seed = config.seed,
            queue = %config.queue,
            duration = %config.duration,
            "Simulator initialized"
        );

        Ok(Self {
            config,
            sim,
            channel,
            collector,
            nodes,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// The underlying engine.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Beacon node `index`, in registration order.
    pub fn node(&self, index: usize) -> Option<&BeaconNode> {
        self.sim.entity(self.nodes.get(index)?)
    }

    /// Run to the configured duration and report.
    pub fn run(&mut self) -> Result<SimulationReport, SimulatorError> {
        let summary = self.sim.run()?;
        let mut report = SimulationReport::header(&self.config, summary.reason, summary.final_time);
        report.engine = summary.stats;

        for node in &self.nodes {
            let node = self
                .sim
                .entity(node)
                .ok_or(SimulatorError::MissingEntity(node.id()))?;
            report.beacons_sent += node.stats().beacons_sent;
            report.beacons_received += node.stats().beacons_received;
        }
        report.channel = self
            .sim
            .entity(&self.channel)
            .ok_or(SimulatorError::MissingEntity(self.channel.id()))?
            .stats()
            .clone();
        report.latency = self
            .sim
            .entity(&self.collector)
            .ok_or(SimulatorError::MissingEntity(self.collector.id()))?
            .summary()
            .cloned()
            .unwrap_or_default();

        info!(
            end_reason = %report.end_reason,
            final_time = %report.final_time,
            beacons_sent = report.beacons_sent,
            beacons_received = report.beacons_received,
            "Simulation complete"
        );
        Ok(report)
    }
}

/// Run `runs` independent simulations in parallel, seeded
/// `config.seed`, `config.seed + 1`, ...
///
/// Each run owns its engine, so results match running them one by one.
pub fn run_sweep(
    config: &SimulatorConfig,
    runs: u64,
) -> Vec<Result<SimulationReport, SimulatorError>> {
    (0..runs)
        .into_par_iter()
        .map(|i| {
            let config = config.clone().with_seed(config.seed.wrapping_add(i));
            debug!(run = i, seed = config.seed, "Starting sweep run");
            Simulator::new(config)?.run()
        })
        .collect()
}

/// Results of a uniform timer workload run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UniformReport {
    pub seed: u64,
    pub queue: QueueKind,
    pub events: usize,
    pub fired: u64,
    pub out_of_order: u64,
    pub end_reason: EndReason,
    pub final_time: SimTime,
    pub engine: SimulationStats,
}

/// Fire a seeded uniform workload on the given queue backend.
pub fn run_uniform(
    mut workload: UniformWorkload,
    queue: QueueKind,
    seed: u64,
) -> Result<UniformReport, SimulatorError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let times = workload.fire_times(&mut rng);

    let mut sim = Simulation::new(SimulationConfig::default().with_queue(queue));
    let sink = sim.register(TimerSink::new())?;
    workload::install(&mut sim, &sink, &times)?;

    let summary = sim.run()?;
    let sink = sim
        .entity(&sink)
        .ok_or(SimulatorError::MissingEntity(sink.id()))?;

    Ok(UniformReport {
        seed,
        queue,
        events: workload.events(),
        fired: sink.fired(),
        out_of_order: sink.out_of_order(),
        end_reason: summary.reason,
        final_time: summary.final_time,
        engine: summary.stats,
    })
}
