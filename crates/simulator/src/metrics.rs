//! Metrics collection and reporting.

use crate::channel::ChannelStats;
use crate::config::SimulatorConfig;
use hdrhistogram::Histogram;
use serde::Serialize;
use tempo_core::{Entity, SimTime};
use tempo_simulation::{Context, EndReason, QueueKind, SimulationStats};
use tempo_types::HOUR;
use tracing::{debug, warn};

/// Highest latency the collector resolves, in ticks.
const MAX_TRACKED_LATENCY: u64 = HOUR;

/// Entity that collects beacon delivery latencies.
///
/// Nodes report each reception to the collector as an event. The
/// collector's end-of-run hook freezes the distribution into a
/// [`LatencySummary`].
pub struct StatsCollector {
    latencies: Histogram<u64>,
    summary: Option<LatencySummary>,
}

impl StatsCollector {
    /// Create a collector tracking latencies up to one hour with three
    /// significant figures of precision.
    pub fn new() -> Result<Self, hdrhistogram::CreationError> {
        Ok(Self {
            latencies: Histogram::new_with_bounds(1, MAX_TRACKED_LATENCY, 3)?,
            summary: None,
        })
    }

    /// Record one delivery latency, in ticks.
    ///
    /// Latencies beyond the tracked range are counted at the ceiling.
    pub fn record_delivery(&mut self, latency: u64) {
        if latency > MAX_TRACKED_LATENCY {
            warn!(latency, "Delivery latency beyond tracked range");
        }
        self.latencies.saturating_record(latency);
    }

    /// Number of deliveries recorded.
    pub fn deliveries(&self) -> u64 {
        self.latencies.len()
    }

    /// Freeze the latency distribution.
    pub fn finalize(&mut self, ctx: &mut Context<'_>) {
        let summary = LatencySummary::from_histogram(&self.latencies);
        debug!(time = %ctx.now(), deliveries = summary.count, "Finalized latency statistics");
        self.summary = Some(summary);
    }

    /// The frozen distribution, once the run has ended.
    pub fn summary(&self) -> Option<&LatencySummary> {
        self.summary.as_ref()
    }
}

impl Entity for StatsCollector {
    fn name(&self) -> &'static str {
        "stats-collector"
    }
}

/// Delivery latency distribution, in ticks.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p99: u64,
}

impl LatencySummary {
    fn from_histogram(histogram: &Histogram<u64>) -> Self {
        if histogram.is_empty() {
            return Self::default();
        }
        Self {
            count: histogram.len(),
            min: histogram.min(),
            max: histogram.max(),
            mean: histogram.mean(),
            p50: histogram.value_at_quantile(0.5),
            p99: histogram.value_at_quantile(0.99),
        }
    }
}

/// Results of one beacon network run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub nodes: u32,
    pub queue: QueueKind,
    pub end_reason: EndReason,
    pub final_time: SimTime,
    pub beacons_sent: u64,
    pub beacons_received: u64,
    pub channel: ChannelStats,
    pub latency: LatencySummary,
    pub engine: SimulationStats,
}

impl SimulationReport {
    pub(crate) fn header(
        config: &SimulatorConfig,
        end_reason: EndReason,
        final_time: SimTime,
    ) -> Self {
        Self {
            seed: config.seed,
            nodes: config.nodes,
            queue: config.queue,
            end_reason,
            final_time,
            beacons_sent: 0,
            beacons_received: 0,
            channel: ChannelStats::default(),
            latency: LatencySummary::default(),
            engine: SimulationStats::default(),
        }
    }

    /// Fraction of scheduled deliveries that were lost.
    pub fn loss_ratio(&self) -> f64 {
        let attempted = self.channel.deliveries + self.channel.dropped_loss;
        if attempted == 0 {
            0.0
        } else {
            self.channel.dropped_loss as f64 / attempted as f64
        }
    }

    /// Print a human-readable summary.
    pub fn print_summary(&self) {
        println!("\n=== Simulation Report ===");
        println!("Seed:              {}", self.seed);
        println!("Nodes:             {}", self.nodes);
        println!("Queue:             {}", self.queue);
        println!("Ended:             {} at {}", self.end_reason, self.final_time);
        println!("Events processed:  {}", self.engine.events_processed);
        println!("Peak pending:      {}", self.engine.peak_pending);
        println!("Beacons sent:      {}", self.beacons_sent);
        println!("Beacons received:  {}", self.beacons_received);
        println!("Loss ratio:        {:.4}", self.loss_ratio());
        println!(
            "Latency (ns):      min {} / p50 {} / p99 {} / max {} (mean {:.1})",
            self.latency.min,
            self.latency.p50,
            self.latency.p99,
            self.latency.max,
            self.latency.mean
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_empty_histogram() {
        let collector = StatsCollector::new().unwrap();
        assert_eq!(collector.deliveries(), 0);
        assert_eq!(
            LatencySummary::from_histogram(&collector.latencies),
            LatencySummary::default()
        );
    }

    #[test]
    fn test_summary_quantiles() {
        let mut collector = StatsCollector::new().unwrap();
        for latency in 1..=100 {
            collector.record_delivery(latency);
        }
        let summary = LatencySummary::from_histogram(&collector.latencies);
        assert_eq!(summary.count, 100);
        assert_eq!(summary.min, 1);
        assert_eq!(summary.max, 100);
        assert!((49..=51).contains(&summary.p50));
        assert!((98..=100).contains(&summary.p99));
    }

    #[test]
    fn test_millisecond_latencies_are_resolved() {
        let mut collector = StatsCollector::new().unwrap();
        collector.record_delivery(2_000_000);
        collector.record_delivery(2_400_000);
        let summary = LatencySummary::from_histogram(&collector.latencies);
        assert_eq!(summary.count, 2);
        // Three significant figures: within 0.1% of the recorded value.
        assert!((1_998_000..=2_000_000).contains(&summary.min), "min {}", summary.min);
        assert!((2_400_000..=2_402_400).contains(&summary.max), "max {}", summary.max);
        assert!(summary.mean > 2_000_000.0 && summary.mean < 2_402_400.0);
    }

    #[test]
    fn test_latency_beyond_range_saturates() {
        let mut collector = StatsCollector::new().unwrap();
        collector.record_delivery(u64::MAX);
        let summary = LatencySummary::from_histogram(&collector.latencies);
        assert_eq!(summary.count, 1);
        assert!(summary.max >= MAX_TRACKED_LATENCY);
    }

    #[test]
    fn test_loss_ratio() {
        let config = SimulatorConfig::default();
        let mut report = SimulationReport::header(&config, EndReason::Exhausted, SimTime::ZERO);
        assert_eq!(report.loss_ratio(), 0.0);
        report.channel.deliveries = 3;
        report.channel.dropped_loss = 1;
        assert_eq!(report.loss_ratio(), 0.25);
    }
}
