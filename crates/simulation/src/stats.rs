//! Statistics collected during a run.

use serde::Serialize;
use std::collections::BTreeMap;

/// Counters maintained by the event loop.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Events accepted into the pending set.
    pub events_scheduled: u64,
    /// Events dispatched to their target.
    pub events_processed: u64,
    /// Events that could not be delivered.
    pub dispatch_failures: u64,
    /// Largest pending-set size observed.
    pub peak_pending: usize,
    /// Dispatches per operation name.
    pub by_op: BTreeMap<&'static str, u64>,
}

impl SimulationStats {
    pub(crate) fn record_scheduled(&mut self, pending: usize) {
        self.events_scheduled += 1;
        self.peak_pending = self.peak_pending.max(pending);
    }

    pub(crate) fn record_processed(&mut self, op: &'static str) {
        self.events_processed += 1;
        *self.by_op.entry(op).or_default() += 1;
    }

    /// Events scheduled but never fired.
    pub fn events_unfired(&self) -> u64 {
        self.events_scheduled
            .saturating_sub(self.events_processed + self.dispatch_failures)
    }

    /// Dispatch count for one operation.
    pub fn processed_for(&self, op: &str) -> u64 {
        self.by_op.get(op).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = SimulationStats::default();
        stats.record_scheduled(1);
        stats.record_scheduled(2);
        stats.record_scheduled(1);
        stats.record_processed("tick");
        stats.record_processed("tick");
        assert_eq!(stats.peak_pending, 2);
        assert_eq!(stats.processed_for("tick"), 2);
        assert_eq!(stats.processed_for("tock"), 0);
        assert_eq!(stats.events_unfired(), 1);
    }
}
