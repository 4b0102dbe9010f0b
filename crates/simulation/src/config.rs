//! Run configuration.

use crate::event_queue::QueueKind;
use serde::{Deserialize, Serialize};
use tempo_core::SimTime;

/// What the event loop does when an event cannot be delivered.
///
/// Applies to events whose target was retired after scheduling, or whose
/// proxy does not match the registered entity's type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Log, count in the run statistics, and keep going.
    #[default]
    Skip,
    /// End the run with [`EndReason::Aborted`](crate::EndReason::Aborted).
    Abort,
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Events later than this are never fired.
    pub end_time: Option<SimTime>,

    /// Upper bound on dispatched events.
    ///
    /// A guard against models that reschedule themselves forever.
    pub max_events: Option<u64>,

    /// Pending-event-set backend.
    pub queue: QueueKind,

    /// Handling of undeliverable events.
    pub missing_entity: FaultPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            end_time: None,
            max_events: None,
            queue: QueueKind::default(),
            missing_entity: FaultPolicy::default(),
        }
    }
}

impl SimulationConfig {
    /// Stop at `end_time`.
    pub fn with_end_time(mut self, end_time: SimTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Stop after `max_events` dispatches.
    pub fn with_max_events(mut self, max_events: u64) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Use the given queue backend.
    pub fn with_queue(mut self, queue: QueueKind) -> Self {
        self.queue = queue;
        self
    }

    /// Set the undeliverable-event policy.
    pub fn with_missing_entity(mut self, policy: FaultPolicy) -> Self {
        self.missing_entity = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "end_time": 5000,
            "max_events": null,
            "queue": "splay",
            "missing_entity": "abort"
        }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            SimulationConfig::default()
                .with_end_time(SimTime(5000))
                .with_queue(QueueKind::Splay)
                .with_missing_entity(FaultPolicy::Abort)
        );
    }
}
