//! Checkpoint Save/Restore Tests
//!
//! A snapshot taken between two dispatches must resume into a run that is
//! indistinguishable from the uninterrupted one: same dispatch sequence,
//! same counters, same final report. Tampered or mismatched snapshots must
//! be rejected before any state is rebuilt.

use cellular_simulator_core_rs::{
    SchemeConfig, Simulation, SimulationConfig, SimulationError, StateSnapshot, StochasticSource,
    TrafficConfig,
};

/// Contended chain with the warm-up threshold placed deep enough that a
/// snapshot taken a few dozen steps in always lands before the discard
fn contended_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        num_stations: 6,
        channels_per_station: 10,
        coverage_m: 2000.0,
        total_calls: 300,
        warm_up_calls: 150,
        rng_seed: seed,
        scheme: SchemeConfig::ReservedHandover {
            reserved_channels: 1,
        },
    }
}

fn build(config: &SimulationConfig) -> Simulation {
    let traffic = TrafficConfig {
        mean_inter_arrival_s: 0.5,
        ..TrafficConfig::default()
    };
    let mut source = StochasticSource::new(traffic, config.num_stations, config.coverage_m);
    Simulation::new(config.clone(), &mut source).expect("valid config")
}

// ============================================================================
// Resume Equivalence
// ============================================================================

#[test]
fn test_restored_run_finishes_like_the_uninterrupted_one() {
    let config = contended_config(99);

    let mut original = build(&config);
    for _ in 0..137 {
        assert!(original.step(), "run ended before the snapshot point");
    }

    let snapshot = original.snapshot().expect("snapshot never fails mid-run");
    let log_len_at_snapshot = original.outcome_log().len();

    // 137 steps dispatch at most 137 initiations, so the warm-up reset at
    // 150 lies ahead of the snapshot and must fire again after restore
    let report_original = original.run();

    let mut restored = Simulation::restore(config, &snapshot).expect("snapshot restores");
    let report_restored = restored.run();

    assert_eq!(report_original, report_restored);

    // The restored log starts empty, so it must equal the original's
    // post-snapshot suffix
    assert_eq!(
        &original.outcome_log().outcomes()[log_len_at_snapshot..],
        restored.outcome_log().outcomes()
    );
}

#[test]
fn test_resume_equivalence_across_seeds_and_cut_points() {
    for seed in [1u64, 7, 42, 1337, 0xDEAD] {
        let mut config = contended_config(seed);
        config.total_calls = 200;
        config.warm_up_calls = 0;

        let steps = 50 + (seed % 100) as usize;
        let mut original = build(&config);
        for _ in 0..steps {
            assert!(original.step());
        }

        let snapshot = original.snapshot().unwrap();
        let report_original = original.run();

        let mut restored = Simulation::restore(config, &snapshot).unwrap();
        let report_restored = restored.run();

        assert_eq!(
            report_original, report_restored,
            "seed {} diverged after restore",
            seed
        );
    }
}

#[test]
fn test_snapshot_of_a_finished_run_restores_finished() {
    let config = contended_config(5);
    let mut original = build(&config);
    let report = original.run();

    let snapshot = original.snapshot().unwrap();
    let mut restored = Simulation::restore(config, &snapshot).unwrap();

    assert!(!restored.step(), "a drained run has nothing left to dispatch");
    assert_eq!(restored.report(), report);
}

// ============================================================================
// Persistence Format
// ============================================================================

#[test]
fn test_snapshot_round_trips_through_json() {
    let config = contended_config(21);
    let mut sim = build(&config);
    for _ in 0..80 {
        assert!(sim.step());
    }

    let snapshot = sim.snapshot().unwrap();
    let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
    let reloaded: StateSnapshot = serde_json::from_str(&json).expect("snapshot deserializes");

    assert_eq!(snapshot, reloaded);

    // The reloaded copy must also restore and finish identically
    let report_direct = Simulation::restore(config.clone(), &snapshot).unwrap().run();
    let report_reloaded = Simulation::restore(config, &reloaded).unwrap().run();
    assert_eq!(report_direct, report_reloaded);
}

// ============================================================================
// Rejection Paths
// ============================================================================

#[test]
fn test_restore_rejects_a_different_scheme() {
    let config = contended_config(13);
    let mut sim = build(&config);
    for _ in 0..40 {
        assert!(sim.step());
    }
    let snapshot = sim.snapshot().unwrap();

    let foreign = SimulationConfig {
        scheme: SchemeConfig::FullAccess,
        ..config
    };
    let err = Simulation::restore(foreign, &snapshot).unwrap_err();
    assert!(matches!(err, SimulationError::ConfigHashMismatch { .. }));
}

#[test]
fn test_restore_rejects_tampered_occupancy() {
    let config = contended_config(13);
    let mut sim = build(&config);
    for _ in 0..40 {
        assert!(sim.step());
    }
    let mut snapshot = sim.snapshot().unwrap();

    // Leak one channel: mark an extra ordinary channel in use at some
    // station; no pending event owns it, so conservation must fail
    let station = snapshot
        .stations
        .iter_mut()
        .find(|s| s.ordinary_free > 0)
        .expect("6 stations x 10 channels cannot all be busy");
    station.ordinary_free -= 1;

    let err = Simulation::restore(config, &snapshot).unwrap_err();
    assert!(matches!(err, SimulationError::StateValidationError(_)));
}

#[test]
fn test_restore_rejects_events_behind_the_clock() {
    let config = contended_config(13);
    let mut sim = build(&config);
    for _ in 0..40 {
        assert!(sim.step());
    }
    let mut snapshot = sim.snapshot().unwrap();
    assert!(!snapshot.pending_events.is_empty());

    // Push the clock past every pending event
    let latest = snapshot
        .pending_events
        .iter()
        .map(|e| e.time())
        .fold(0.0f64, f64::max);
    snapshot.clock_s = latest + 1.0;

    let err = Simulation::restore(config, &snapshot).unwrap_err();
    assert!(matches!(err, SimulationError::StateValidationError(_)));
}
