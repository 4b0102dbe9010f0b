//! Ordering properties of the event loop.
//!
//! Every test runs against each queue backend: the dispatch order must
//! not depend on which one is selected.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempo_core::{EntityId, SimTime, SimulationError};
use tempo_simulation::{
    Context, EndReason, QueueKind, RunState, Simulation, SimulationConfig, StepOutcome,
};
use tempo_test_helpers::{assert_non_decreasing, uniform_times, Recorder};

fn simulation(queue: QueueKind) -> Simulation {
    Simulation::new(SimulationConfig::default().with_queue(queue))
}

fn record(label: &'static str) -> impl FnOnce(&mut Recorder, &mut Context<'_>) {
    move |r, ctx| r.record(ctx.now(), label)
}

/// 1000 events at seeded random times, many of them equal.
///
/// Dispatch order must be the stable sort of creation order by time.
#[test]
fn test_seeded_thousand_events_fire_in_key_order() {
    let times = uniform_times(0xC0FFEE, 1000, 100);
    let mut expected: Vec<(SimTime, usize)> =
        times.iter().enumerate().map(|(i, t)| (*t, i)).collect();
    expected.sort_by_key(|(t, _)| *t);
    let expected: Vec<String> = expected.iter().map(|(_, i)| format!("e{i}")).collect();

    for queue in QueueKind::ALL {
        let mut sim = simulation(queue);
        let recorder = sim.register(Recorder::new()).unwrap();
        for (i, time) in times.iter().enumerate() {
            let label = format!("e{i}");
            sim.schedule_at(&recorder, *time, "record", move |r: &mut Recorder, ctx| {
                r.record(ctx.now(), label)
            })
            .unwrap();
        }

        let summary = sim.run().unwrap();
        assert_eq!(summary.reason, EndReason::Exhausted);
        assert_eq!(summary.stats.events_processed, 1000);

        let log = sim.entity(&recorder).unwrap();
        assert_non_decreasing(&log.times());
        assert_eq!(log.labels(), expected, "backend {queue}");
        assert_eq!(summary.final_time, *times.iter().max().unwrap());
    }
}

#[test]
fn test_equal_times_fire_in_creation_order() {
    for queue in QueueKind::ALL {
        let mut sim = simulation(queue);
        let recorder = sim.register(Recorder::new()).unwrap();
        for label in ["a", "b", "c", "d"] {
            sim.schedule_at(&recorder, SimTime(5), "record", move |r: &mut Recorder, ctx| {
                r.record(ctx.now(), label)
            })
            .unwrap();
        }
        sim.run().unwrap();
        assert_eq!(sim.entity(&recorder).unwrap().labels(), ["a", "b", "c", "d"]);
    }
}

/// Events created by handlers at the current instant fire after every
/// event already pending for that instant.
#[test]
fn test_same_instant_calls_fire_after_existing_events() {
    for queue in QueueKind::ALL {
        let mut sim = simulation(queue);
        let recorder = sim.register(Recorder::new()).unwrap();
        let target = recorder;
        sim.schedule_at(&recorder, SimTime(1), "first", move |r: &mut Recorder, ctx| {
            r.record(ctx.now(), "first");
            ctx.call(&target, "nested", |r: &mut Recorder, ctx| {
                r.record(ctx.now(), "nested")
            })
            .unwrap();
        })
        .unwrap();
        sim.schedule_at(&recorder, SimTime(1), "second", |r: &mut Recorder, ctx| {
            r.record(ctx.now(), "second")
        })
        .unwrap();

        sim.run().unwrap();
        let log = sim.entity(&recorder).unwrap();
        assert_eq!(log.labels(), ["first", "second", "nested"]);
        assert_eq!(log.times(), [SimTime(1); 3]);
    }
}

/// Handlers rescheduling themselves at random delays keep the clock
/// monotone and produce the same trace on every backend.
#[test]
fn test_self_rescheduling_trace_matches_across_backends() {
    fn hop(r: &mut Recorder, ctx: &mut Context<'_>, mut rng: ChaCha8Rng, left: u32) {
        r.record(ctx.now(), format!("hop{left}"));
        if left > 0 {
            let delay = rng.gen_range(0..4);
            ctx.sleep::<Recorder, _>(delay, "hop", move |r, ctx| hop(r, ctx, rng, left - 1))
                .unwrap();
        }
    }

    let mut traces = Vec::new();
    for queue in QueueKind::ALL {
        let mut sim = simulation(queue);
        let recorder = sim.register(Recorder::new()).unwrap();
        for chain in 0..8u64 {
            let rng = ChaCha8Rng::seed_from_u64(chain);
            sim.schedule_at(&recorder, SimTime(chain % 3), "hop", move |r: &mut Recorder, ctx| {
                hop(r, ctx, rng, 50)
            })
            .unwrap();
        }
        sim.run().unwrap();
        let log = sim.entity(&recorder).unwrap().clone();
        assert_non_decreasing(&log.times());
        assert_eq!(log.len(), 8 * 51);
        traces.push(log.log().to_vec());
    }
    assert!(traces.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_runs_are_repeatable() {
    let run = || {
        let mut sim = Simulation::default();
        let recorder = sim.register(Recorder::new()).unwrap();
        for (i, time) in uniform_times(99, 200, 20).into_iter().enumerate() {
            sim.schedule_at(&recorder, time, "record", move |r: &mut Recorder, ctx| {
                r.record(ctx.now(), format!("{i}"))
            })
            .unwrap();
        }
        let summary = sim.run().unwrap();
        (summary, sim.entity(&recorder).unwrap().log().to_vec())
    };
    assert_eq!(run(), run());
}

#[test]
fn test_empty_run_ends_immediately() {
    let mut sim = Simulation::default();
    assert_eq!(sim.state(), RunState::Idle);
    let summary = sim.run().unwrap();
    assert_eq!(summary.reason, EndReason::Exhausted);
    assert_eq!(summary.final_time, SimTime::ZERO);
    assert_eq!(summary.stats.events_processed, 0);
}

#[test]
fn test_step_reports_each_dispatch() {
    let mut sim = Simulation::default();
    let recorder = sim.register(Recorder::new()).unwrap();
    sim.schedule(&recorder, 7, "tick", |r: &mut Recorder, ctx| r.record(ctx.now(), "tick"))
        .unwrap();

    match sim.step().unwrap() {
        StepOutcome::Dispatched { key, target, op } => {
            assert_eq!(key.time, SimTime(7));
            assert_eq!(target, recorder.id());
            assert_eq!(op, "tick");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(sim.now(), SimTime(7));
    assert_eq!(sim.step().unwrap(), StepOutcome::Ended(EndReason::Exhausted));
    assert_eq!(sim.step(), Err(SimulationError::Ended));
}

#[test]
fn test_scheduling_into_the_past_from_a_handler_aborts() {
    for queue in QueueKind::ALL {
        let mut sim = simulation(queue);
        let recorder = sim.register(Recorder::new()).unwrap();
        let me = recorder;
        sim.schedule_at(&recorder, SimTime(10), "rewind", move |_: &mut Recorder, ctx| {
            let result = ctx.schedule_at(&me, SimTime(3), "late", |r: &mut Recorder, ctx| {
                r.record(ctx.now(), "late")
            });
            assert!(matches!(
                result,
                Err(SimulationError::CausalityViolation { .. })
            ));
        })
        .unwrap();
        sim.schedule_at(&recorder, SimTime(20), "after", |r: &mut Recorder, ctx| {
            r.record(ctx.now(), "after")
        })
        .unwrap();

        let err = sim.run().unwrap_err();
        assert_eq!(
            err,
            SimulationError::CausalityViolation {
                origin: recorder.id(),
                target: recorder.id(),
                op: "late",
                requested: SimTime(3),
                now: SimTime(10),
            }
        );
        assert_eq!(sim.state(), RunState::Ended(EndReason::Aborted));
        assert!(sim.entity(&recorder).unwrap().is_empty());
    }
}

#[test]
fn test_scheduling_into_the_past_from_the_driver_is_rejected() {
    let mut sim = Simulation::default();
    let recorder = sim.register(Recorder::new()).unwrap();
    sim.schedule_at(&recorder, SimTime(10), "a", record("a"))
        .unwrap();
    sim.step().unwrap();

    let err = sim
        .schedule_at(&recorder, SimTime(4), "b", record("b"))
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::CausalityViolation { origin: EntityId::SYSTEM, .. }
    ));

    // The run itself is unaffected.
    sim.schedule_at(&recorder, SimTime(10), "c", record("c"))
        .unwrap();
    let summary = sim.run().unwrap();
    assert_eq!(summary.reason, EndReason::Exhausted);
    assert_eq!(sim.entity(&recorder).unwrap().labels(), ["a", "c"]);
}

#[test]
fn test_time_overflow_aborts() {
    let mut sim = Simulation::default();
    let recorder = sim.register(Recorder::new()).unwrap();
    sim.schedule_at(&recorder, SimTime(1), "overflow", |_: &mut Recorder, ctx| {
        let result = ctx.sleep::<Recorder, _>(u64::MAX, "never", record("x"));
        assert!(result.is_err());
    })
    .unwrap();

    let err = sim.run().unwrap_err();
    assert_eq!(
        err,
        SimulationError::TimeOverflow {
            now: SimTime(1),
            delay: u64::MAX
        }
    );
}

#[test]
fn test_peak_pending_and_counters() {
    let mut sim = Simulation::default();
    let recorder = sim.register(Recorder::new()).unwrap();
    for t in 0..5 {
        sim.schedule_at(&recorder, SimTime(t), "tick", record("tick"))
            .unwrap();
    }
    let stats = sim.run().unwrap().stats;
    assert_eq!(stats.events_scheduled, 5);
    assert_eq!(stats.events_processed, 5);
    assert_eq!(stats.peak_pending, 5);
    assert_eq!(stats.processed_for("tick"), 5);
    assert_eq!(stats.events_unfired(), 0);
}
