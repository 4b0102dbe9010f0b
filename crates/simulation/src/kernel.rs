//! Run-scoped scheduling state shared by the event loop and [`Context`].
//!
//! Everything here belongs to exactly one run: the pending set, the
//! clock and the sequence counter are never global.
//!
//! [`Context`]: crate::Context

use crate::event_queue::{AnyQueue, PendingEventSet};
use crate::stats::SimulationStats;
use crate::Context;
use tempo_core::{
    Entity, EntityId, Event, EventKey, EventSeq, Proxy, SimResult, SimTime, SimulationError,
};
use tracing::trace;

/// A call waiting in the pending set: the argument snapshot bound to the
/// target operation.
pub type Invocation = Box<dyn FnOnce(&mut dyn Entity, &mut Context<'_>) -> SimResult<()>>;

/// Wrap a typed call into an [`Invocation`].
///
/// The proxy's view is resolved when the event fires, so a type mismatch
/// surfaces at dispatch time as [`SimulationError::CapabilityMismatch`].
pub(crate) fn bind<C, F>(proxy: Proxy<C>, op: &'static str, f: F) -> Invocation
where
    C: ?Sized + 'static,
    F: FnOnce(&mut C, &mut Context<'_>) + 'static,
{
    Box::new(move |entity: &mut dyn Entity, ctx: &mut Context<'_>| {
        let target = proxy
            .resolve(entity)
            .ok_or(SimulationError::CapabilityMismatch {
                entity: proxy.id(),
                op,
            })?;
        f(target, ctx);
        Ok(())
    })
}

/// Wrap a callback owned by the system entity.
pub(crate) fn bind_system<F>(f: F) -> Invocation
where
    F: FnOnce(&mut Context<'_>) + 'static,
{
    Box::new(move |_: &mut dyn Entity, ctx: &mut Context<'_>| {
        f(ctx);
        Ok(())
    })
}

/// A call to deliver when the run ends.
pub(crate) struct EndHook {
    pub(crate) target: EntityId,
    pub(crate) op: &'static str,
    pub(crate) invocation: Invocation,
}

pub(crate) struct Kernel {
    pub(crate) queue: AnyQueue<Invocation>,
    pub(crate) now: SimTime,
    pub(crate) next_seq: EventSeq,
    pub(crate) end_time: Option<SimTime>,
    pub(crate) end_requested: bool,
    pub(crate) ended: bool,
    /// First fatal fault raised from inside a handler.
    pub(crate) fault: Option<SimulationError>,
    /// Liveness per slot; slot 0 is the system entity.
    pub(crate) live: Vec<bool>,
    /// Id held by slot 1. Ids are never reused across resets, so this
    /// starts past every id an earlier run handed out.
    first_id: u64,
    pub(crate) end_hooks: Vec<EndHook>,
    pub(crate) stats: SimulationStats,
}

impl Kernel {
    pub(crate) fn new(
        queue: AnyQueue<Invocation>,
        end_time: Option<SimTime>,
        first_id: u64,
    ) -> Self {
        Self {
            queue,
            now: SimTime::ZERO,
            next_seq: EventSeq::FIRST,
            end_time,
            end_requested: false,
            ended: false,
            fault: None,
            live: vec![true],
            first_id,
            end_hooks: Vec::new(),
            stats: SimulationStats::default(),
        }
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Slot of `id` in this run's entity table, if it belongs to this run.
    pub(crate) fn slot(&self, id: EntityId) -> Option<usize> {
        if id.is_system() {
            return Some(0);
        }
        let offset = u64::from(id.0).checked_sub(self.first_id)?;
        let slot = usize::try_from(offset).ok()?.checked_add(1)?;
        (slot < self.live.len()).then_some(slot)
    }

    pub(crate) fn is_live(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|slot| self.live[slot])
    }

    /// Id for the next registered entity.
    pub(crate) fn next_id(&self) -> SimResult<EntityId> {
        u32::try_from(self.id_watermark())
            .map(EntityId)
            .map_err(|_| SimulationError::EntityLimit)
    }

    /// First id available to a run that follows this one.
    pub(crate) fn id_watermark(&self) -> u64 {
        self.first_id + (self.live.len() as u64 - 1)
    }

    /// Absolute time `delay` ticks from now.
    pub(crate) fn after(&self, delay: u64) -> SimResult<SimTime> {
        self.now
            .checked_add(delay)
            .ok_or(SimulationError::TimeOverflow {
                now: self.now,
                delay,
            })
    }

    /// Create an event and insert it into the pending set.
    ///
    /// The sequence number is minted here, at creation, which is what
    /// makes equal-time events fire in creation order.
    pub(crate) fn enqueue(
        &mut self,
        origin: EntityId,
        target: EntityId,
        time: SimTime,
        op: &'static str,
        invocation: Invocation,
    ) -> SimResult<EventSeq> {
        if self.ended {
            return Err(SimulationError::Ended);
        }
        if time < self.now {
            return Err(SimulationError::CausalityViolation {
                origin,
                target,
                op,
                requested: time,
                now: self.now,
            });
        }
        if !self.is_live(target) {
            return Err(SimulationError::UnknownEntity { entity: target, op });
        }

        let seq = self.next_seq;
        self.next_seq = seq.next();
        self.queue
            .insert(Event::new(EventKey::new(time, seq), target, op, invocation));
        self.stats.record_scheduled(self.queue.len());

        trace!(%origin, entity = %target, op, %time, seq = seq.0, "Scheduled event");
        Ok(seq)
    }

    /// Lower the end-time bound to `time`.
    pub(crate) fn end_at(&mut self, origin: EntityId, time: SimTime) -> SimResult<()> {
        if self.ended {
            return Err(SimulationError::Ended);
        }
        if time < self.now {
            return Err(SimulationError::CausalityViolation {
                origin,
                target: EntityId::SYSTEM,
                op: "end_at",
                requested: time,
                now: self.now,
            });
        }
        self.end_time = Some(self.end_time.map_or(time, |t| t.min(time)));
        Ok(())
    }

    pub(crate) fn add_end_hook(
        &mut self,
        target: EntityId,
        op: &'static str,
        invocation: Invocation,
    ) -> SimResult<()> {
        if self.ended {
            return Err(SimulationError::Ended);
        }
        if !self.is_live(target) {
            return Err(SimulationError::UnknownEntity { entity: target, op });
        }
        self.end_hooks.push(EndHook {
            target,
            op,
            invocation,
        });
        Ok(())
    }
}
