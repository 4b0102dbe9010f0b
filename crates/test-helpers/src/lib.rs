//! Test helpers for Tempo.
//!
//! Provides a [`Recorder`] entity that logs what it was asked to do and
//! when, plus seeded generators for reproducible event times.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempo_core::{Entity, SimTime};

/// Entity that records `(time, label)` for every call it receives.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    log: Vec<(SimTime, String)>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, time: SimTime, label: impl Into<String>) {
        self.log.push((time, label.into()));
    }

    pub fn log(&self) -> &[(SimTime, String)] {
        &self.log
    }

    /// Recorded labels in dispatch order.
    pub fn labels(&self) -> Vec<&str> {
        self.log.iter().map(|(_, label)| label.as_str()).collect()
    }

    /// Recorded times in dispatch order.
    pub fn times(&self) -> Vec<SimTime> {
        self.log.iter().map(|(time, _)| *time).collect()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl Entity for Recorder {}

/// Deterministic RNG for fixtures.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `count` times drawn uniformly from `[0, horizon)` ticks, in draw order.
///
/// A small `horizon` makes equal times common, which is what
/// tie-breaking tests want.
pub fn uniform_times(seed: u64, count: usize, horizon: u64) -> Vec<SimTime> {
    let mut rng = seeded_rng(seed);
    (0..count)
        .map(|_| SimTime(rng.gen_range(0..horizon.max(1))))
        .collect()
}

/// Assert that `times` never decreases.
#[track_caller]
pub fn assert_non_decreasing(times: &[SimTime]) {
    for pair in times.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "time went backwards: {} then {}",
            pair[0],
            pair[1]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_times_are_reproducible() {
        let a = uniform_times(7, 100, 50);
        let b = uniform_times(7, 100, 50);
        assert_eq!(a, b);
        assert!(a.iter().all(|t| t.0 < 50));
        assert_ne!(a, uniform_times(8, 100, 50));
    }

    #[test]
    fn test_recorder() {
        let mut recorder = Recorder::new();
        recorder.record(SimTime(3), "a");
        recorder.record(SimTime(5), "b");
        assert_eq!(recorder.labels(), vec!["a", "b"]);
        assert_eq!(recorder.times(), vec![SimTime(3), SimTime(5)]);
        assert_non_decreasing(&recorder.times());
    }
}
