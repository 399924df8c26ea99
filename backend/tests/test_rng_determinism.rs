//! RNG Determinism Tests
//!
//! The whole simulator leans on one property: same seed, same run. These
//! tests pin the raw generator; the end-to-end guarantee is covered by
//! the simulation and checkpoint suites.

use cellular_simulator_core_rs::RngManager;

#[test]
fn test_same_seed_same_sequence() {
    let mut rng1 = RngManager::new(42);
    let mut rng2 = RngManager::new(42);

    for i in 0..1000 {
        assert_eq!(rng1.next(), rng2.next(), "sequences diverged at draw {}", i);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let mut rng1 = RngManager::new(42);
    let mut rng2 = RngManager::new(43);

    let draws1: Vec<u64> = (0..16).map(|_| rng1.next()).collect();
    let draws2: Vec<u64> = (0..16).map(|_| rng2.next()).collect();

    assert_ne!(draws1, draws2, "different seeds produced the same sequence");
}

#[test]
fn test_state_roundtrip_resumes_sequence() {
    let mut original = RngManager::new(98765);

    // Burn some draws, then capture the state mid-sequence
    for _ in 0..137 {
        original.next();
    }
    let state = original.get_state();
    let mut resumed = RngManager::new(state);

    for i in 0..1000 {
        assert_eq!(
            original.next(),
            resumed.next(),
            "resumed generator diverged at draw {}",
            i
        );
    }
}

#[test]
fn test_range_covers_all_stations() {
    let mut rng = RngManager::new(2024);
    let mut seen = [false; 20];

    for _ in 0..10_000 {
        let station = rng.range(0, 20);
        assert!((0..20).contains(&station));
        seen[station as usize] = true;
    }

    assert!(
        seen.iter().all(|&s| s),
        "10k draws should hit every station index at least once"
    );
}

#[test]
fn test_sampler_draw_counts_are_fixed() {
    // Exponential consumes one uniform, normal consumes two. If that ever
    // changed, every seeded run in existence would silently shift.
    let mut counting = RngManager::new(7777);
    let mut reference = RngManager::new(7777);

    counting.next_exponential(1.0);
    reference.next();
    assert_eq!(counting.get_state(), reference.get_state());

    counting.next_normal(0.0, 1.0);
    reference.next();
    reference.next();
    assert_eq!(counting.get_state(), reference.get_state());
}

#[test]
fn test_exponential_deterministic_across_instances() {
    let mut rng1 = RngManager::new(13);
    let mut rng2 = RngManager::new(13);

    for _ in 0..100 {
        assert_eq!(rng1.next_exponential(1.3698), rng2.next_exponential(1.3698));
    }
}
