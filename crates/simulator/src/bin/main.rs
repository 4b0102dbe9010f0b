//! Tempo Simulator CLI
//!
//! Run deterministic beacon network simulations with configurable
//! parameters.
//!
//! # Example
//!
//! ```bash
//! # Run a deterministic simulation with a fixed seed
//! tempo-sim --seed 42 -n 16 -d 30 --loss 0.05
//!
//! # Four runs in parallel, seeds 7..=10, JSON output
//! tempo-sim --seed 7 --runs 4 --json
//!
//! # Queue benchmark: 100k uniform timers on the splay backend
//! tempo-sim --uniform 100000 --queue splay
//! ```

use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tempo_core::SimTime;
use tempo_simulation::QueueKind;
use tempo_simulator::{run_sweep, run_uniform, ChannelConfig, SimulatorConfig, UniformWorkload};
use tempo_types::MILLISECOND;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Tempo Simulator
///
/// Runs deterministic discrete-event simulations. Each run is
/// single-threaded and reproducible when the same seed is used.
#[derive(Parser, Debug)]
#[command(name = "tempo-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of beacon nodes
    #[arg(short = 'n', long, default_value = "8")]
    nodes: u32,

    /// Simulation duration in seconds
    #[arg(short = 'd', long, default_value = "10")]
    duration: u64,

    /// Beacon interval in milliseconds
    #[arg(long, default_value = "100")]
    interval_ms: u64,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Pending event set backend (heap, btree, splay)
    #[arg(long, default_value = "heap")]
    queue: QueueKind,

    /// Per-delivery packet loss probability (0.0-1.0)
    #[arg(long, default_value = "0.0")]
    loss: f64,

    /// Number of independent runs, executed in parallel
    #[arg(long, default_value = "1")]
    runs: u64,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Instead of the beacon network, fire this many uniformly timed events
    #[arg(long)]
    uniform: Option<usize>,
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tempo_simulator=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    if let Some(events) = args.uniform {
        return run_uniform_benchmark(&args, events, seed);
    }

    let config = SimulatorConfig::new(args.nodes)
        .with_duration(SimTime::from_secs(args.duration))
        .with_beacon_interval(args.interval_ms.saturating_mul(MILLISECOND))
        .with_channel(ChannelConfig::default().with_loss(args.loss))
        .with_queue(args.queue)
        .with_seed(seed);

    info!(
        nodes = args.nodes,
        duration_secs = args.duration,
        interval_ms = args.interval_ms,
        seed,
        queue = %args.queue,
        loss = args.loss,
        runs = args.runs,
        "Starting simulation"
    );

    let started = Instant::now();
    let results = run_sweep(&config, args.runs.max(1));
    info!(wall_ms = started.elapsed().as_millis() as u64, "All runs finished");

    let mut failed = false;
    for result in results {
        match result {
            Ok(report) if args.json => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    error!(error = %e, "Failed to serialize report");
                    failed = true;
                }
            },
            Ok(report) => report.print_summary(),
            Err(e) => {
                error!(error = %e, "Simulation failed");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_uniform_benchmark(args: &Args, events: usize, seed: u64) -> ExitCode {
    // Roughly ten events per tick so that equal fire times are common.
    let workload = UniformWorkload::new(events, (events / 10) as u64);

    let started = Instant::now();
    let report = match run_uniform(workload, args.queue, seed) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Uniform workload failed");
            return ExitCode::FAILURE;
        }
    };
    let wall = started.elapsed();

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "Failed to serialize report");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("\n=== Uniform Workload ===");
        println!("Seed:          {}", report.seed);
        println!("Queue:         {}", report.queue);
        println!("Events fired:  {} / {}", report.fired, report.events);
        println!("Out of order:  {}", report.out_of_order);
        println!("Final time:    {}", report.final_time);
        println!("Wall time:     {:?}", wall);
    }

    if report.out_of_order == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
