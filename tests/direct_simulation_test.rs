//! End-to-end direct simulation scenarios
//!
//! Hand-built trajectories with known answers, plus seeded Langevin runs
//! checked for internal consistency.

use ndarray::array;

use direct_rates::{
    CvRange,
    DirectSimulation,
    DoubleWell,
    LangevinState,
    LangevinSystem,
    RateEstimator,
    ReplaySource,
    SimulationConfig,
    StateSet,
    StopReason,
    SystemSource,
};

fn x(c: &f64) -> f64 {
    *c
}

/// A: x < -1, B: x ≥ 1, interfaces at x = ∓0.5
fn two_states() -> StateSet<f64> {
    let mut set = StateSet::new();
    set.add_state("A", CvRange::below(x, -1.0)).unwrap();
    set.add_state("B", CvRange::above(x, 1.0)).unwrap();
    set.add_interface_for("A", "A_0", CvRange::below(x, -0.5)).unwrap();
    set.add_interface_for("B", "B_0", CvRange::above(x, 0.5)).unwrap();
    set
}

/// Initial frame in A, then `cycles` round trips A → B → A, each crossing
/// both interfaces once outward
fn oscillation(cycles: usize) -> Vec<f64> {
    let cycle = [-0.7, 0.0, 0.7, 2.0, 0.7, 0.0, -0.7, -2.0];
    let mut frames = vec![-2.0];
    for _ in 0..cycles {
        frames.extend_from_slice(&cycle);
    }
    frames
}

/// Steps during which `state` was the last visited state
fn steps_with_last_state(frames: &[f64], state: &str) -> u64 {
    let classify = |v: f64| {
        if v < -1.0 {
            Some("A")
        } else if v >= 1.0 {
            Some("B")
        } else {
            None
        }
    };
    let mut last = classify(frames[0]);
    let mut steps = 0;
    for &v in &frames[1..] {
        if let Some(s) = classify(v) {
            last = Some(s);
        }
        if last == Some(state) {
            steps += 1;
        }
    }
    steps
}

fn replay_sim(frames: Vec<f64>) -> DirectSimulation<ReplaySource<f64>> {
    let (initial, source) = ReplaySource::from_trajectory(frames).unwrap();
    DirectSimulation::new(source, two_states(), initial, SimulationConfig::default()).unwrap()
}

#[test]
fn test_two_state_oscillation() {
    let frames = oscillation(10);
    let n_frames = (frames.len() - 1) as u64;
    let mut sim = replay_sim(frames.clone());

    let outcome = sim.run(n_frames).unwrap();
    assert!(outcome.is_complete());

    let counts = sim.n_transitions();
    assert_eq!(counts.by_pair[&("A".to_string(), "B".to_string())], 10);
    assert_eq!(counts.by_pair[&("B".to_string(), "A".to_string())], 10);

    let steps_a = steps_with_last_state(&frames, "A");
    let steps_b = steps_with_last_state(&frames, "B");
    assert_eq!(steps_a, 40);
    assert_eq!(steps_b, 40);

    let est = sim.rate_estimator();
    let flux_a = est.flux("A", "A_0").unwrap();
    let flux_b = est.flux("B", "B_0").unwrap();
    assert_eq!(flux_a, 10.0 / steps_a as f64);
    assert_eq!(flux_b, 10.0 / steps_b as f64);

    // every excursion from A ends in B
    let rates = sim.rate_matrix();
    assert_eq!(rates.get("A", "B"), Some(flux_a * 1.0));
    assert_eq!(rates.get("B", "A"), Some(flux_b * 1.0));

    let results = sim.results();
    assert_eq!(results.total_steps, n_frames);
    assert_eq!(results.n_transitions, 20);
    assert_eq!(results.n_flux_events, 20);
}

#[test]
fn test_confined_trajectory() {
    let frames: Vec<f64> = (0..101).map(|i| if i % 2 == 0 { -2.0 } else { -1.5 }).collect();
    let mut sim = replay_sim(frames);
    sim.run(100).unwrap();

    assert_eq!(sim.n_transitions().total, 0);
    assert_eq!(sim.n_flux_events().total, 0);
    let tables = sim.tables();
    assert_eq!(tables.flux_counts_for("A", "A_0").unwrap().opportunities, 100);
    assert_eq!(tables.flux_counts_for("B", "B_0").unwrap().opportunities, 0);
    assert_eq!(sim.fluxes().values().filter(|f| f.is_nan()).count(), 1);
}

#[test]
fn test_rates_undefined_before_transitions() {
    let mut sim = replay_sim(oscillation(1));
    assert!(sim.rate_matrix().is_undefined());
    sim.run(3).unwrap();
    assert!(sim.rate_matrix().is_undefined());
    let results = sim.results();
    assert!(results.rate_matrix.iter().all(|r| r.rate.is_none()));
    assert!(results.to_json_pretty().is_ok());
}

#[test]
fn test_truncated_excursion_at_end() {
    // leaves A and never arrives anywhere
    let mut sim = replay_sim(vec![-2.0, -0.7, 0.0, 0.7]);
    let outcome = sim.run(10).unwrap();
    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert_eq!(outcome.observed, 3);
    assert_eq!(sim.n_transitions().total, 0);
    assert_eq!(sim.n_flux_events().total, 1);
}

fn lx(s: &LangevinState) -> f64 {
    s.x()
}

fn langevin_sim(seed: u64) -> DirectSimulation<SystemSource<LangevinSystem<DoubleWell>>> {
    let system = LangevinSystem::new(DoubleWell::new(1.0), array![-1.0], 0.5, seed).with_dt(2e-3);
    let source = SystemSource::new(system).with_stride(5);
    let initial = source.initial();

    let mut states = StateSet::new();
    states.add_state("A", CvRange::below(lx, -0.7)).unwrap();
    states.add_state("B", CvRange::above(lx, 0.7)).unwrap();
    states.add_interface_for("A", "A_0", CvRange::below(lx, -0.5)).unwrap();
    states.add_interface_for("B", "B_0", CvRange::above(lx, 0.5)).unwrap();

    DirectSimulation::new(source, states, initial, SimulationConfig::default()).unwrap()
}

#[test]
fn test_langevin_run_is_consistent() {
    let mut sim = langevin_sim(11);
    sim.run(20_000).unwrap();

    let tables = sim.tables();
    let ab = tables.transition_count("A", "B").unwrap();
    let ba = tables.transition_count("B", "A").unwrap();
    // with two states transitions alternate
    assert!(ab.abs_diff(ba) <= 1, "A→B = {}, B→A = {}", ab, ba);

    for counts in tables.all_flux_counts() {
        assert!(counts.events <= counts.opportunities);
    }
    let opportunities: u64 = tables.all_flux_counts().iter().map(|c| c.opportunities).sum();
    assert_eq!(opportunities, tables.total_steps());

    // every transition out of A needs at least one exit through A_0
    assert!(tables.flux_counts(0).events >= ab);
}

#[test]
fn test_langevin_reproducible_and_replicas_combine() {
    let mut a = langevin_sim(5);
    let mut b = langevin_sim(5);
    a.run(5_000).unwrap();
    b.run(5_000).unwrap();
    assert_eq!(a.tables(), b.tables());

    let mut c = langevin_sim(6);
    c.run(5_000).unwrap();
    let combined = RateEstimator::from_replicas([a.tables(), c.tables()]).unwrap();
    assert_eq!(combined.tables().total_steps(), 10_000);
    assert_eq!(
        combined.n_transitions().total,
        a.n_transitions().total + c.n_transitions().total
    );
}
