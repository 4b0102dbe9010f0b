//! Uniformly distributed timer workload.

use crate::workload::WorkloadGenerator;
use rand::Rng;
use tempo_core::SimTime;

/// `events` timers with fire times drawn uniformly from `[0, horizon)`.
///
/// A short horizon relative to `events` produces many equal fire times,
/// which exercises tie-breaking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformWorkload {
    events: usize,
    horizon: u64,
}

impl UniformWorkload {
    /// Create a workload. A zero horizon is treated as one tick.
    pub fn new(events: usize, horizon: u64) -> Self {
        Self {
            events,
            horizon: horizon.max(1),
        }
    }

    pub fn events(&self) -> usize {
        self.events
    }
}

impl WorkloadGenerator for UniformWorkload {
    fn fire_times(&mut self, rng: &mut impl Rng) -> Vec<SimTime> {
        (0..self.events)
            .map(|_| SimTime(rng.gen_range(0..self.horizon)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fire_times_within_horizon() {
        let mut workload = UniformWorkload::new(500, 64);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let times = workload.fire_times(&mut rng);
        assert_eq!(times.len(), 500);
        assert!(times.iter().all(|t| t.0 < 64));
    }

    #[test]
    fn test_zero_horizon() {
        let mut workload = UniformWorkload::new(10, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(workload
            .fire_times(&mut rng)
            .iter()
            .all(|t| *t == SimTime::ZERO));
    }
}
