//! The API handed to an entity while it handles an event.

use crate::kernel::{bind, bind_system, Kernel};
use tempo_core::{Entity, EntityId, EventSeq, Proxy, SimResult, SimTime};
use tracing::error;

/// Mutable view of the running simulation, passed to every handler.
///
/// Provides the handler with:
/// - the current virtual time
/// - the ability to call other entities (as events) and to schedule its
///   own continuations
/// - termination control
///
/// The context borrows the run's scheduling state but not the entity
/// table, so a handler can never reach another entity's state except
/// through a scheduled call.
///
/// A causality, overflow or ended fault returned from any method here is
/// also recorded against the run, which aborts once the handler returns.
pub struct Context<'a> {
    kernel: &'a mut Kernel,
    current: EntityId,
    op: &'static str,
}

impl<'a> Context<'a> {
    pub(crate) fn new(kernel: &'a mut Kernel, current: EntityId, op: &'static str) -> Self {
        Self {
            kernel,
            current,
            op,
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    /// The entity whose handler is running.
    #[inline]
    pub fn self_id(&self) -> EntityId {
        self.current
    }

    /// Name of the operation being handled.
    #[inline]
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// A proxy to the running entity as its concrete type.
    pub fn me<T: Entity>(&self) -> Proxy<T> {
        Proxy::new(self.current)
    }

    /// Number of events waiting in the pending set.
    pub fn pending(&self) -> usize {
        self.kernel.queue_len()
    }

    /// Whether `id` is a registered, live entity.
    pub fn is_live(&self, id: EntityId) -> bool {
        self.kernel.is_live(id)
    }

    /// Call `target` at the current instant.
    ///
    /// The call runs after the current handler returns and after every
    /// event already pending for this instant.
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
        let time = self.check(self.kernel.after(delay))?;
        self.schedule_at(target, time, op, f)
    }

    /// Call `target` at absolute time `time`, which must not be in the past.
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
        let (from, call) = (self.current, bind(*target, op, f));
        let result = self.kernel.enqueue(from, target.id(), time, op, call);
        self.check(result)
    }

    /// Resume the running entity after `delay` ticks.
    ///
    /// This is how a handler "sleeps": `f` is the rest of the routine and
    /// runs as a new event at `now + delay`. The current handler should
    /// return right after calling this. Locals needed by the continuation
    /// are moved into `f` or kept in the entity's own state.
    pub fn sleep<T, F>(&mut self, delay: u64, op: &'static str, f: F) -> SimResult<EventSeq>
    where
        T: Entity,
        F: FnOnce(&mut T, &mut Context<'_>) + 'static,
    {
        let me = self.me::<T>();
        self.schedule(&me, delay, op, f)
    }

    /// Run a one-shot callback at `time`, owned by the system entity.
    pub fn run_at<F>(&mut self, time: SimTime, f: F) -> SimResult<EventSeq>
    where
        F: FnOnce(&mut Context<'_>) + 'static,
    {
        let (from, to, call) = (self.current, EntityId::SYSTEM, bind_system(f));
        let result = self.kernel.enqueue(from, to, time, "run_at", call);
        self.check(result)
    }

    /// Call `target` once when the run ends.
    pub fn at_end<C, F>(&mut self, target: &Proxy<C>, op: &'static str, f: F) -> SimResult<()>
    where
        C: ?Sized + 'static,
        F: FnOnce(&mut C, &mut Context<'_>) + 'static,
    {
        let call = bind(*target, op, f);
        let result = self.kernel.add_end_hook(target.id(), op, call);
        self.check(result)
    }

    /// End the run once virtual time passes `time`.
    ///
    /// Lowers any earlier bound; never raises it.
    pub fn end_at(&mut self, time: SimTime) -> SimResult<()> {
        let result = self.kernel.end_at(self.current, time);
        self.check(result)
    }

    /// End the run as soon as this handler returns.
    pub fn end_now(&mut self) {
        self.kernel.end_requested = true;
    }

    /// Record fatal faults against the run before handing them back.
    fn check<T>(&mut self, result: SimResult<T>) -> SimResult<T> {
        if let Err(e) = &result {
            if e.is_fatal() && !self.kernel.ended && self.kernel.fault.is_none() {
                error!(
                    entity = %self.current,
                    op = self.op,
                    error = %e,
                    "Fatal scheduling fault"
                );
                self.kernel.fault = Some(e.clone());
            }
        }
        result
    }
}
