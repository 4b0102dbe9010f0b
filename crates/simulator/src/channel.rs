//! Shared broadcast channel with deterministic latency, jitter and loss.
//!
//! Stands in for radio propagation: every frame put on the channel is
//! delivered to each other attached node as a separate event. Loss and
//! jitter are drawn from the channel's own seeded RNG, so a run's
//! deliveries depend only on the seed and the order of broadcasts.

use crate::config::ChannelConfig;
use crate::node::NetHandler;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tempo_core::{Entity, EntityId, Proxy, SimTime};
use tempo_simulation::Context;
use tracing::{trace, warn};

/// A beacon on the air.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Node that transmitted the frame.
    pub source: EntityId,
    /// Per-source sequence number.
    pub seq: u64,
    /// Time the frame was handed to the channel.
    pub sent_at: SimTime,
}

/// Channel counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Frames handed to the channel.
    pub frames_broadcast: u64,
    /// Per-receiver deliveries scheduled.
    pub deliveries: u64,
    /// Per-receiver deliveries lost.
    pub dropped_loss: u64,
}

/// The shared medium.
pub struct Channel {
    config: ChannelConfig,
    rng: ChaCha8Rng,
    attached: Vec<Proxy<dyn NetHandler>>,
    stats: ChannelStats,
}

impl Channel {
    /// Create a channel with its own RNG stream.
    pub fn new(config: ChannelConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            attached: Vec::new(),
            stats: ChannelStats::default(),
        }
    }

    /// Attach a receiver.
    pub fn attach(&mut self, node: Proxy<dyn NetHandler>) {
        self.attached.push(node);
    }

    pub fn attached(&self) -> usize {
        self.attached.len()
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Deliver `frame` to every attached node except its source.
    pub fn broadcast(&mut self, frame: Frame, ctx: &mut Context<'_>) {
        self.stats.frames_broadcast += 1;

        for i in 0..self.attached.len() {
            let peer = self.attached[i];
            if peer.id() == frame.source {
                continue;
            }
            if self.should_drop() {
                self.stats.dropped_loss += 1;
                trace!(
                    source = %frame.source,
                    peer = %peer.id(),
                    seq = frame.seq,
                    "Frame dropped: loss"
                );
                continue;
            }

            let delay = self.sample_delay();
            let delivered = frame.clone();
            match ctx.schedule(&peer, delay, "receive", move |node, ctx| {
                node.receive(delivered, ctx)
            }) {
                Ok(_) => self.stats.deliveries += 1,
                Err(e) => warn!(peer = %peer.id(), error = %e, "Failed to schedule delivery"),
            }
        }
    }

    fn should_drop(&mut self) -> bool {
        self.config.loss > 0.0 && self.rng.gen::<f64>() < self.config.loss
    }

    /// Base latency plus uniform jitter in `[0, jitter]`.
    fn sample_delay(&mut self) -> u64 {
        let jitter = if self.config.jitter == 0 {
            0
        } else {
            self.rng.gen_range(0..=self.config.jitter)
        };
        self.config.latency.saturating_add(jitter)
    }
}

impl Entity for Channel {
    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_within_bounds() {
        let config = ChannelConfig::default().with_latency(100).with_jitter(20);
        let mut channel = Channel::new(config, 1);
        for _ in 0..1000 {
            let delay = channel.sample_delay();
            assert!((100..=120).contains(&delay));
        }
    }

    #[test]
    fn test_loss_extremes() {
        let mut lossless = Channel::new(ChannelConfig::default(), 1);
        assert!((0..100).all(|_| !lossless.should_drop()));

        let mut dead = Channel::new(ChannelConfig::default().with_loss(1.0), 1);
        assert!((0..100).all(|_| dead.should_drop()));
    }

    #[test]
    fn test_same_seed_same_draws() {
        let config = ChannelConfig::default().with_jitter(1_000).with_loss(0.3);
        let mut a = Channel::new(config, 9);
        let mut b = Channel::new(config, 9);
        for _ in 0..100 {
            assert_eq!(a.should_drop(), b.should_drop());
            assert_eq!(a.sample_delay(), b.sample_delay());
        }
    }
}
