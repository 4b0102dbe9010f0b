//! Beacon nodes.
//!
//! A node is wired to the channel through two capability interfaces:
//! the channel sees it as a [`NetHandler`], and the harness starts it as
//! an [`AppInterface`]. Both views address the same entity.
//!
//! The application loop cannot block, so it is written as an explicit
//! state machine. Every wait is a [`Context::sleep`] whose continuation
//! re-enters [`BeaconNode::resume`], which advances the state:
//!
//! ```text
//!   Idle ──start──► Backoff ──(random backoff)──► Sending
//!                      ▲                             │ (airtime)
//!                      │                             ▼
//!                      └────(beacon interval)──── Sleeping
//! ```

use crate::channel::{Channel, Frame};
use crate::metrics::StatsCollector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tempo_core::{capabilities, Entity, Proxy};
use tempo_simulation::Context;
use tracing::{debug, trace, warn};

/// Network-facing interface of a node.
pub trait NetHandler {
    /// A frame arrived from the channel.
    fn receive(&mut self, frame: Frame, ctx: &mut Context<'_>);
}

/// Application-facing interface of a node.
pub trait AppInterface {
    /// Begin beaconing. Has no effect if already started.
    fn start(&mut self, ctx: &mut Context<'_>);
}

/// Where the beacon loop is parked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconState {
    /// Not started.
    #[default]
    Idle,
    /// Waiting a random backoff before transmitting.
    Backoff,
    /// Frame on the air.
    Sending,
    /// Waiting out the beacon interval.
    Sleeping,
}

/// Timing of the beacon loop, in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeaconTiming {
    pub interval: u64,
    pub max_backoff: u64,
    pub airtime: u64,
}

/// Per-node counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub beacons_sent: u64,
    pub beacons_received: u64,
}

/// A node that periodically broadcasts a beacon and records what it hears.
pub struct BeaconNode {
    channel: Proxy<Channel>,
    collector: Proxy<StatsCollector>,
    timing: BeaconTiming,
    rng: ChaCha8Rng,
    state: BeaconState,
    next_seq: u64,
    stats: NodeStats,
}

impl BeaconNode {
    pub fn new(
        channel: Proxy<Channel>,
        collector: Proxy<StatsCollector>,
        timing: BeaconTiming,
        seed: u64,
    ) -> Self {
        Self {
            channel,
            collector,
            timing,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: BeaconState::Idle,
            next_seq: 0,
            stats: NodeStats::default(),
        }
    }

    pub fn state(&self) -> BeaconState {
        self.state
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Continuation of every wait in the beacon loop.
    fn resume(&mut self, ctx: &mut Context<'_>) {
        match self.state {
            BeaconState::Backoff => self.transmit(ctx),
            BeaconState::Sending => {
                self.enter(BeaconState::Sleeping, ctx);
                self.wait(self.timing.interval, "wake", ctx);
            }
            BeaconState::Sleeping => self.backoff(ctx),
            BeaconState::Idle => {
                warn!(node = %ctx.self_id(), "Resumed while idle");
            }
        }
    }

    fn backoff(&mut self, ctx: &mut Context<'_>) {
        self.enter(BeaconState::Backoff, ctx);
        let delay = self.rng.gen_range(0..=self.timing.max_backoff);
        self.wait(delay, "backoff", ctx);
    }

    fn transmit(&mut self, ctx: &mut Context<'_>) {
        self.enter(BeaconState::Sending, ctx);

        let frame = Frame {
            source: ctx.self_id(),
            seq: self.next_seq,
            sent_at: ctx.now(),
        };
        self.next_seq += 1;

        match ctx.call(&self.channel, "broadcast", move |channel, ctx| {
            channel.broadcast(frame, ctx)
        }) {
            Ok(_) => self.stats.beacons_sent += 1,
            Err(e) => warn!(node = %ctx.self_id(), error = %e, "Failed to hand frame to channel"),
        }
        self.wait(self.timing.airtime, "airtime", ctx);
    }

    fn wait(&mut self, delay: u64, op: &'static str, ctx: &mut Context<'_>) {
        if let Err(e) = ctx.sleep::<BeaconNode, _>(delay, op, |node, ctx| node.resume(ctx)) {
            warn!(node = %ctx.self_id(), op, error = %e, "Failed to schedule continuation");
        }
    }

    fn enter(&mut self, state: BeaconState, ctx: &Context<'_>) {
        trace!(
            node = %ctx.self_id(),
            time = %ctx.now(),
            from = ?self.state,
            to = ?state,
            "Beacon state"
        );
        self.state = state;
    }
}

impl NetHandler for BeaconNode {
    fn receive(&mut self, frame: Frame, ctx: &mut Context<'_>) {
        self.stats.beacons_received += 1;

        let latency = ctx.now().duration_since(frame.sent_at).unwrap_or(0);
        if let Err(e) = ctx.call(&self.collector, "record", move |collector, _| {
            collector.record_delivery(latency)
        }) {
            warn!(node = %ctx.self_id(), error = %e, "Failed to report delivery");
        }
    }
}

impl AppInterface for BeaconNode {
    fn start(&mut self, ctx: &mut Context<'_>) {
        if self.state != BeaconState::Idle {
            debug!(node = %ctx.self_id(), state = ?self.state, "Already started");
            return;
        }
        debug!(node = %ctx.self_id(), "Starting beacon loop");
        self.backoff(ctx);
    }
}

impl Entity for BeaconNode {
    fn name(&self) -> &'static str {
        "beacon-node"
    }
}

capabilities!(BeaconNode: dyn NetHandler, dyn AppInterface);
