//! Workload generation for simulations.
//!
//! A workload decides when timer events fire. It is driven by the run's
//! seeded RNG so the same seed always yields the same schedule.

mod uniform;

pub use uniform::UniformWorkload;

use rand::Rng;
use tempo_core::{Entity, Proxy, SimResult, SimTime};
use tempo_simulation::Simulation;
use tracing::warn;

/// Trait for generating timer workloads.
pub trait WorkloadGenerator {
    /// Fire times, in creation order.
    fn fire_times(&mut self, rng: &mut impl Rng) -> Vec<SimTime>;
}

/// Entity that receives timer events and checks they arrive in
/// `(time, creation index)` order.
#[derive(Debug, Default)]
pub struct TimerSink {
    fired: u64,
    last: Option<(SimTime, u64)>,
    out_of_order: u64,
}

impl TimerSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn fire(&mut self, time: SimTime, index: u64) {
        let key = (time, index);
        if let Some(last) = self.last {
            if key <= last {
                warn!(?last, ?key, "Timer fired out of order");
                self.out_of_order += 1;
            }
        }
        self.last = Some(key);
        self.fired += 1;
    }

    /// Timers fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Timers that fired before an earlier-keyed one.
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }
}

impl Entity for TimerSink {
    fn name(&self) -> &'static str {
        "timer-sink"
    }
}

/// Schedule one timer per fire time against `sink`.
pub fn install(sim: &mut Simulation, sink: &Proxy<TimerSink>, times: &[SimTime]) -> SimResult<()> {
    for (index, time) in times.iter().enumerate() {
        let index = index as u64;
        sim.schedule_at(sink, *time, "timer", move |timers, ctx| {
            timers.fire(ctx.now(), index)
        })?;
    }
    Ok(())
}
