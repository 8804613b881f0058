//! Property-based tests for the flux/transition tracker
//!
//! - Split runs accumulate exactly like one run
//! - 0 ≤ events ≤ opportunities at every step
//! - Transition counts match an independent count of state changes
//! - Opportunities account for every step after the first state visit

use proptest::prelude::*;

use direct_rates::{
    CvRange,
    DirectSimulation,
    FluxTracker,
    ConflictPolicy,
    ReplaySource,
    SimulationConfig,
    StateSet,
};

fn x(c: &f64) -> f64 {
    *c
}

/// A < -2, B in [-0.5, 0.5), C ≥ 2, one interface each
fn three_states() -> StateSet<f64> {
    let mut set = StateSet::new();
    set.add_state("A", CvRange::below(x, -2.0)).unwrap();
    set.add_state("B", CvRange::new(x, -0.5, 0.5)).unwrap();
    set.add_state("C", CvRange::above(x, 2.0)).unwrap();
    set.add_interface_for("A", "A_0", CvRange::below(x, -1.5)).unwrap();
    set.add_interface_for("B", "B_0", CvRange::new(x, -1.0, 1.0)).unwrap();
    set.add_interface_for("C", "C_0", CvRange::above(x, 1.5)).unwrap();
    set
}

fn state_of(v: f64) -> Option<usize> {
    if v < -2.0 {
        Some(0)
    } else if (-0.5..0.5).contains(&v) {
        Some(1)
    } else if v >= 2.0 {
        Some(2)
    } else {
        None
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Independent uniform positions on [-3, 3)
fn arb_trajectory(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-3.0f64..3.0, 2..max_len)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: run(a); run(b) ≡ run(a + b)
    #[test]
    fn prop_split_runs_accumulate(frames in arb_trajectory(200), split in 0usize..200) {
        let n = (frames.len() - 1) as u64;
        let a = (split as u64).min(n);
        let b = n - a;

        let (initial, source) = ReplaySource::from_trajectory(frames.clone()).unwrap();
        let mut whole = DirectSimulation::new(source, three_states(), initial, SimulationConfig::default()).unwrap();
        whole.run(a + b).unwrap();

        let (initial, source) = ReplaySource::from_trajectory(frames).unwrap();
        let mut parts = DirectSimulation::new(source, three_states(), initial, SimulationConfig::default()).unwrap();
        parts.run(a).unwrap();
        parts.run(b).unwrap();

        prop_assert_eq!(whole.tables(), parts.tables());
    }

    /// Property: flux counts stay bounded at every step
    #[test]
    fn prop_flux_counts_bounded(frames in arb_trajectory(200)) {
        let mut tracker = FluxTracker::new(three_states(), ConflictPolicy::Fail).unwrap();
        tracker.seed(&frames[0]).unwrap();
        for (i, v) in frames[1..].iter().enumerate() {
            tracker.observe(v, i as u64 + 1).unwrap();
            for counts in tracker.tables().all_flux_counts() {
                prop_assert!(counts.events <= counts.opportunities);
            }
        }
    }

    /// Property: Σ_B N(A → B) equals the number of times the trajectory
    /// left A and next entered a different named state
    #[test]
    fn prop_transition_conservation(frames in arb_trajectory(300)) {
        let mut tracker = FluxTracker::new(three_states(), ConflictPolicy::Fail).unwrap();
        tracker.seed(&frames[0]).unwrap();
        for (i, v) in frames[1..].iter().enumerate() {
            tracker.observe(v, i as u64 + 1).unwrap();
        }

        // reference: the sequence of distinct consecutive named states
        let visits: Vec<usize> = frames.iter().filter_map(|&v| state_of(v)).collect();
        let mut expected = [0u64; 3];
        for w in visits.windows(2) {
            if w[0] != w[1] {
                expected[w[0]] += 1;
            }
        }

        for (a, &n) in expected.iter().enumerate() {
            prop_assert_eq!(tracker.tables().outgoing_transitions(a), n);
        }
    }

    /// Property: after the first state visit every step is an opportunity
    /// for exactly one pair (one interface per state)
    #[test]
    fn prop_opportunities_cover_steps(frames in arb_trajectory(200)) {
        let mut tracker = FluxTracker::new(three_states(), ConflictPolicy::Fail).unwrap();
        tracker.seed(&frames[0]).unwrap();
        for (i, v) in frames[1..].iter().enumerate() {
            tracker.observe(v, i as u64 + 1).unwrap();
        }

        let first_visit = frames.iter().position(|&v| state_of(v).is_some());
        let expected = match first_visit {
            Some(0) => (frames.len() - 1) as u64,
            Some(k) => (frames.len() - k) as u64,
            None => 0,
        };
        let total: u64 = tracker.tables().all_flux_counts().iter().map(|c| c.opportunities).sum();
        prop_assert_eq!(total, expected);
    }

    /// Property: a trajectory confined to one state never transitions or
    /// crosses, and accrues one opportunity per step
    #[test]
    fn prop_confined_trajectory(frames in proptest::collection::vec(-3.0f64..-2.5, 2..200)) {
        let mut tracker = FluxTracker::new(three_states(), ConflictPolicy::Fail).unwrap();
        tracker.seed(&frames[0]).unwrap();
        for (i, v) in frames[1..].iter().enumerate() {
            tracker.observe(v, i as u64 + 1).unwrap();
        }
        let tables = tracker.tables();
        prop_assert_eq!(tables.total_transitions(), 0);
        prop_assert_eq!(tables.total_flux_events(), 0);
        prop_assert_eq!(tables.flux_counts(0).opportunities, tables.total_steps());
    }
}
