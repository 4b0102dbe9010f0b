//! Simulation clock and event loop.
//!
//! A run moves through `Idle → Running → Ended`. While running, each step
//! removes the minimum pending event, advances the clock to its fire time
//! and invokes the target synchronously. The handler may schedule more
//! events (never earlier than the clock) before control returns here.

use crate::config::{FaultPolicy, SimulationConfig};
use crate::event_queue::{AnyQueue, HeapQueue, PendingEventSet};
use crate::kernel::{bind, bind_system, Invocation, Kernel};
use crate::stats::SimulationStats;
use crate::Context;
use serde::Serialize;
use std::fmt;
use tempo_core::{Entity, EntityId, EventKey, EventSeq, Proxy, SimResult, SimTime, SimulationError};
use tracing::{debug, info, trace, warn};

/// The always-present entity that owns one-shot callbacks.
#[derive(Debug, Default)]
pub struct SystemEntity;

impl Entity for SystemEntity {
    fn name(&self) -> &'static str {
        "system"
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// No events were left.
    Exhausted,
    /// The next event lay beyond the end-time bound.
    EndTimeReached,
    /// An entity (or the driver) asked to stop.
    Requested,
    /// The configured event budget was used up.
    StepLimit,
    /// A fatal fault stopped the run.
    Aborted,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndReason::Exhausted => "exhausted",
            EndReason::EndTimeReached => "end time reached",
            EndReason::Requested => "requested",
            EndReason::StepLimit => "step limit",
            EndReason::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Set up, not started. The clock reads zero.
    Idle,
    /// Dispatching events.
    Running,
    /// Terminal. Nothing more is scheduled or fired.
    Ended(EndReason),
}

/// Result of a single [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One event was taken from the pending set and handled.
    Dispatched {
        /// Its ordering key.
        key: EventKey,
        /// Its target.
        target: EntityId,
        /// Its operation.
        op: &'static str,
    },
    /// The run ended instead.
    Ended(EndReason),
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Why the run ended.
    pub reason: EndReason,
    /// Clock value at the end.
    pub final_time: SimTime,
    /// Event-loop counters.
    pub stats: SimulationStats,
}

/// A single discrete-event simulation run.
///
/// Owns the entities, the pending event set and the virtual clock. Runs
/// are fully independent: separate runs may live on separate threads,
/// but each run is driven by one thread only.
pub struct Simulation {
    config: SimulationConfig,
    state: RunState,
    /// Entity table, one slot per id registered this run. A slot is empty
    /// while its entity is handling an event, and after it is retired.
    entities: Vec<Option<Box<dyn Entity>>>,
    kernel: Kernel,
}

impl Simulation {
    /// Create an idle run with the configured queue backend.
    pub fn new(config: SimulationConfig) -> Self {
        let queue = config.queue.build();
        Self::with_queue(config, queue)
    }

    /// Create an idle run on a specific queue (including custom backends).
    ///
    /// `config.queue` is ignored.
    pub fn with_queue(config: SimulationConfig, mut queue: AnyQueue<Invocation>) -> Self {
        queue.clear();
        debug!(
            queue = queue.kind_name(),
            end_time = ?config.end_time,
            max_events = ?config.max_events,
            missing_entity = ?config.missing_entity,
            "Created simulation"
        );
        let kernel = Kernel::new(queue, config.end_time, 1);
        Self {
            config,
            state: RunState::Idle,
            entities: vec![Some(Box::new(SystemEntity))],
            kernel,
        }
    }

    /// The run's configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Why the run ended, if it has.
    pub fn end_reason(&self) -> Option<EndReason> {
        match self.state {
            RunState::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    /// Whether the run has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.state, RunState::Ended(_))
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    /// Current end-time bound.
    pub fn end_time(&self) -> Option<SimTime> {
        self.kernel.end_time
    }

    /// Number of events not yet fired.
    pub fn pending_events(&self) -> usize {
        self.kernel.queue.len()
    }

    /// Event-loop counters so far.
    pub fn stats(&self) -> &SimulationStats {
        &self.kernel.stats
    }

    /// Proxy to the system entity.
    pub fn system(&self) -> Proxy<SystemEntity> {
        Proxy::new(EntityId::SYSTEM)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Wiring
    // ═══════════════════════════════════════════════════════════════════════

    /// Register an entity and get its proxy.
    ///
    /// Ids are never reused, including across [`reset`](Self::reset), so a
    /// proxy from an earlier run never reaches a newer entity.
    pub fn register<T: Entity>(&mut self, entity: T) -> SimResult<Proxy<T>> {
        let id = self.kernel.next_id()?;
        debug!(%id, name = entity.name(), "Registered entity");
        self.entities.push(Some(Box::new(entity)));
        self.kernel.live.push(true);
        Ok(Proxy::new(id))
    }

    /// Retire an entity. Pending and future calls to it fail.
    ///
    /// Returns `false` if `id` was not live. The system entity cannot be
    /// retired.
    pub fn deregister(&mut self, id: EntityId) -> bool {
        if id.is_system() || !self.kernel.is_live(id) {
            return false;
        }
        let Some(slot) = self.kernel.slot(id) else {
            return false;
        };
        self.kernel.live[slot] = false;
        self.entities[slot] = None;
        debug!(%id, "Retired entity");
        true
    }

    /// Number of live entities, excluding the system entity.
    pub fn entity_count(&self) -> usize {
        self.kernel.live.iter().skip(1).filter(|live| **live).count()
    }

    /// Inspect an entity between steps.
    pub fn entity<T: Entity>(&self, proxy: &Proxy<T>) -> Option<&T> {
        let slot = self.kernel.slot(proxy.id())?;
        let entity: &dyn Entity = self.entities.get(slot)?.as_deref()?;
        entity.as_any().downcast_ref::<T>()
    }

    /// Mutably inspect an entity between steps.
    ///
    /// Intended for setup and tests; model code should use events.
    pub fn entity_mut<T: Entity>(&mut self, proxy: &Proxy<T>) -> Option<&mut T> {
        let slot = self.kernel.slot(proxy.id())?;
        let entity: &mut dyn Entity = self.entities.get_mut(slot)?.as_deref_mut()?;
        proxy.resolve(entity)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling from the driver
    // ═══════════════════════════════════════════════════════════════════════
    //
    // Faults here are returned to the caller and leave the run untouched.

    /// Call `target` at the current instant.
    pub fn call<C, F>(&mut self, target: &Proxy<C>, op: &'static str, f: F) -> SimResult<EventSeq>
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut C, &mut Context<'_>) + 'static,
    {
        self.schedule(target, 0, op, f)
    }

    /// Call `target` after `delay` ticks.
    pub fn schedule<C, F>(
        &mut self,
        target: &Proxy<C>,
        delay: u64,
        op: &'static str,
        f: F,
    ) -> SimResult<EventSeq>
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut C, &mut Context<'_>) + 'static,
    {
        let time = self.kernel.after(delay)?;
        self.schedule_at(target, time, op, f)
    }

    /// Call `target` at absolute time `time`.
    pub fn schedule_at<C, F>(
        &mut self,
        target: &Proxy<C>,
        time: SimTime,
        op: &'static str,
        f: F,
    ) -> SimResult<EventSeq>
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut C, &mut Context<'_>) + 'static,
    {
        let (system, call) = (EntityId::SYSTEM, bind(*target, op, f));
        self.kernel.enqueue(system, target.id(), time, op, call)
    }

    /// Run a one-shot callback at `time`.
    pub fn run_at<F>(&mut self, time: SimTime, f: F) -> SimResult<EventSeq>
    where
        F: FnOnce(&mut Context<'_>) + 'static,
    {
        let (system, call) = (EntityId::SYSTEM, bind_system(f));
        self.kernel.enqueue(system, system, time, "run_at", call)
    }

    /// Call `target` once when the run ends, e.g. to finalize statistics.
    ///
    /// Hooks run in registration order with the clock at the final time,
    /// unless the run is aborted.
    pub fn at_end<C, F>(&mut self, target: &Proxy<C>, op: &'static str, f: F) -> SimResult<()>
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut C, &mut Context<'_>) + 'static,
    {
        let call = bind(*target, op, f);
        self.kernel.add_end_hook(target.id(), op, call)
    }

    /// End the run once virtual time passes `time`.
    pub fn end_at(&mut self, time: SimTime) -> SimResult<()> {
        self.kernel.end_at(EntityId::SYSTEM, time)
    }

    /// End the run now.
    pub fn end_now(&mut self) -> SimResult<()> {
        if self.is_ended() {
            return Err(SimulationError::Ended);
        }
        self.finish(EndReason::Requested);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event loop
    // ═══════════════════════════════════════════════════════════════════════

    /// Dispatch exactly one event, or end the run if none may fire.
    ///
    /// Stepping an ended run is an error.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        match self.state {
            RunState::Ended(_) => return Err(SimulationError::Ended),
            RunState::Idle => self.start(),
            RunState::Running => {}
        }

        if let Some(max) = self.config.max_events {
            if self.kernel.stats.events_processed >= max {
                return Ok(self.finish(EndReason::StepLimit));
            }
        }

        let next_time = match self.kernel.queue.peek_first() {
            Some(event) => event.time(),
            None => return Ok(self.finish(EndReason::Exhausted)),
        };
        if let Some(end) = self.kernel.end_time {
            if next_time > end {
                self.kernel.now = self.kernel.now.max(end);
                return Ok(self.finish(EndReason::EndTimeReached));
            }
        }
        let Some(event) = self.kernel.queue.remove_first() else {
            return Ok(self.finish(EndReason::Exhausted));
        };

        debug_assert!(event.time() >= self.kernel.now, "event precedes the clock");
        self.kernel.now = event.time();

        let (key, target, op) = (event.key(), event.target(), event.op());
        trace!(time = %key.time, seq = key.seq.0, entity = %target, op, "Dispatching event");

        match self.deliver(target, op, event.into_payload()) {
            Ok(()) => self.kernel.stats.record_processed(op),
            Err(e) => {
                self.kernel.stats.dispatch_failures += 1;
                warn!(time = %key.time, entity = %target, op, error = %e, "Undeliverable event");
                if self.config.missing_entity == FaultPolicy::Abort {
                    self.finish(EndReason::Aborted);
                    return Err(e);
                }
            }
        }

        if let Some(fault) = self.kernel.fault.take() {
            self.finish(EndReason::Aborted);
            return Err(fault);
        }
        if self.kernel.end_requested {
            self.finish(EndReason::Requested);
        }

        Ok(StepOutcome::Dispatched { key, target, op })
    }

    /// Run until the run ends.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        let reason = loop {
            if let StepOutcome::Ended(reason) = self.step()? {
                break reason;
            }
            if let Some(reason) = self.end_reason() {
                break reason;
            }
        };
        Ok(self.summarize(reason))
    }

    /// Run until virtual time passes `time` (or an earlier termination).
    pub fn run_until(&mut self, time: SimTime) -> SimResult<RunSummary> {
        self.end_at(time)?;
        self.run()
    }

    /// Summary of the finished run, or `None` while it is still going.
    pub fn summary(&self) -> Option<RunSummary> {
        self.end_reason().map(|reason| self.summarize(reason))
    }

    fn summarize(&self, reason: EndReason) -> RunSummary {
        RunSummary {
            reason,
            final_time: self.kernel.now,
            stats: self.kernel.stats.clone(),
        }
    }

    /// Return to `Idle` for another run on the same backend.
    ///
    /// Drops every entity, pending event and hook, and zeroes the clock,
    /// the sequence counter and the statistics. Proxies from the old run
    /// stay dead.
    pub fn reset(&mut self) {
        let placeholder = AnyQueue::Heap(HeapQueue::new());
        let mut queue = std::mem::replace(&mut self.kernel.queue, placeholder);
        queue.clear();
        let first_id = self.kernel.id_watermark();
        self.kernel = Kernel::new(queue, self.config.end_time, first_id);
        self.entities.clear();
        self.entities.push(Some(Box::new(SystemEntity)));
        self.state = RunState::Idle;
        debug!("Simulation reset");
    }

    fn start(&mut self) {
        self.state = RunState::Running;
        info!(
            entities = self.entity_count(),
            pending = self.kernel.queue.len(),
            queue = self.kernel.queue.kind_name(),
            end_time = ?self.kernel.end_time,
            "Starting simulation"
        );
    }

    /// Invoke a call on its target with exclusive access to the target.
    fn deliver(
        &mut self,
        target: EntityId,
        op: &'static str,
        invocation: Invocation,
    ) -> SimResult<()> {
        let unknown = SimulationError::UnknownEntity { entity: target, op };
        let Some(slot) = self.kernel.slot(target) else {
            return Err(unknown);
        };
        let Some(mut entity) = self.entities.get_mut(slot).and_then(Option::take) else {
            return Err(unknown);
        };

        let result = {
            let mut ctx = Context::new(&mut self.kernel, target, op);
            invocation(&mut *entity, &mut ctx)
        };

        if self.kernel.is_live(target) {
            self.entities[slot] = Some(entity);
        }
        result
    }

    fn finish(&mut self, reason: EndReason) -> StepOutcome {
        // Hooks observe the final clock but may not schedule anything.
        self.kernel.ended = true;
        if reason != EndReason::Aborted {
            for hook in std::mem::take(&mut self.kernel.end_hooks) {
                if let Err(e) = self.deliver(hook.target, hook.op, hook.invocation) {
                    self.kernel.stats.dispatch_failures += 1;
                    warn!(
                        entity = %hook.target,
                        op = hook.op,
                        error = %e,
                        "Undeliverable end hook"
                    );
                }
            }
        }
        self.kernel.end_hooks.clear();
        self.state = RunState::Ended(reason);

        info!(
            %reason,
            final_time = %self.kernel.now,
            events_processed = self.kernel.stats.events_processed,
            unfired = self.kernel.queue.len(),
            "Simulation ended"
        );
        StepOutcome::Ended(reason)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.state)
            .field("now", &self.kernel.now)
            .field("entities", &self.entity_count())
            .field("queue", &self.kernel.queue)
            .finish()
    }
}
