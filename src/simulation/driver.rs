//! Direct simulation driver: the step loop
//!
//! Pulls configurations from a trajectory source one at a time and feeds
//! them to a flux tracker, in source order. `run(a); run(b)` observes the
//! same configurations as `run(a + b)`.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use super::cache::ClassificationCache;
use super::cancel::CancelToken;
use super::checkpoint::Checkpoint;
use super::config::SimulationConfig;
use super::source::TrajectorySource;
use crate::error::Result;
use crate::rates::{FluxEventCounts, RateEstimator, RateMatrix, Results, TransitionCounts};
use crate::tracker::{
    AccountingTables,
    FluxPairKey,
    FluxTracker,
    Membership,
    Observation,
    StateSet,
};

/// Why a `run` call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All requested steps were observed
    Completed,
    /// The trajectory source ended early
    Exhausted,
    /// The cancel token was raised
    Cancelled,
    /// The configured wall-clock budget ran out
    TimedOut,
}

/// Result of one `run` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub requested: u64,
    pub observed: u64,
    pub stop: StopReason,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Completed
    }
}

type KeyFn<C> = Box<dyn Fn(&C) -> u64 + Send + Sync>;

/// Single-trajectory direct simulation
pub struct DirectSimulation<S: TrajectorySource> {
    source: S,
    tracker: FluxTracker<S::Config>,
    current: S::Config,
    /// Pulled from the source but refused by the tracker
    pending: Option<S::Config>,
    config: SimulationConfig,
    cancel: CancelToken,
    cache: Option<ClassificationCache>,
    cache_key: Option<KeyFn<S::Config>>,
}

impl<S: TrajectorySource> DirectSimulation<S> {
    /// Set up a run from `initial`
    ///
    /// The initial configuration seeds the last visited state; it is not a
    /// step and is never counted.
    pub fn new(
        source: S,
        states: StateSet<S::Config>,
        initial: S::Config,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut tracker = FluxTracker::new(states, config.conflict_policy)?;
        tracker.seed(&initial)?;
        let cache = (config.cache_capacity > 0)
            .then(|| ClassificationCache::new(config.cache_capacity));

        debug!(
            n_states = tracker.states().n_states(),
            n_pairs = tracker.states().pairs().len(),
            initial_state = ?tracker.last_state(),
            "direct simulation initialized"
        );

        Ok(Self {
            source,
            tracker,
            current: initial,
            pending: None,
            config,
            cancel: CancelToken::new(),
            cache,
            cache_key: None,
        })
    }

    /// Continue a checkpointed run from `current`, the configuration the
    /// checkpointed run last observed
    pub fn resume(
        source: S,
        states: StateSet<S::Config>,
        current: S::Config,
        checkpoint: Checkpoint,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut tracker = FluxTracker::new(states, config.conflict_policy)?;
        tracker.restore(checkpoint.cursor, checkpoint.tables)?;
        let cache = (config.cache_capacity > 0)
            .then(|| ClassificationCache::new(config.cache_capacity));

        info!(
            step = tracker.step(),
            total_steps = tracker.tables().total_steps(),
            "direct simulation resumed"
        );

        Ok(Self {
            source,
            tracker,
            current,
            pending: None,
            config,
            cancel: CancelToken::new(),
            cache,
            cache_key: None,
        })
    }

    /// Identity of a configuration for the classification cache
    ///
    /// Has no effect unless `cache_capacity > 0`.
    pub fn with_cache_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&S::Config) -> u64 + Send + Sync + 'static,
    {
        self.cache_key = Some(Box::new(key));
        self
    }

    /// Handle for interrupting `run` from elsewhere
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Observe up to `n_steps` further configurations
    ///
    /// Returns early, with the tables consistent up to the last observed
    /// step, when the source is exhausted, the cancel token is raised or the
    /// wall-clock budget is spent. Engine failures and classification
    /// conflicts abort the call; tables keep everything counted before. A
    /// configuration refused by the tracker is held back and offered again
    /// by the next call instead of pulling a new one from the source.
    pub fn run(&mut self, n_steps: u64) -> Result<RunOutcome> {
        let _span = info_span!("direct_run", requested = n_steps).entered();
        let started = Instant::now();
        let deadline = self.config.max_wall_time();
        let mut observed = 0;
        let mut stop = StopReason::Completed;

        info!(start_step = self.tracker.step(), "run started");

        while observed < n_steps {
            if self.cancel.is_cancelled() {
                stop = StopReason::Cancelled;
                break;
            }
            if deadline.is_some_and(|limit| started.elapsed() >= limit) {
                stop = StopReason::TimedOut;
                break;
            }

            let next = match self.pending.take() {
                Some(config) => config,
                None => match self.source.next(&self.current)? {
                    Some(config) => config,
                    None => {
                        stop = StopReason::Exhausted;
                        break;
                    }
                },
            };

            let step = self.tracker.step() + 1;
            let observation = match self.observe(&next, step) {
                Ok(observation) => observation,
                Err(err) => {
                    self.pending = Some(next);
                    return Err(err);
                }
            };
            if let Some(tr) = observation.transition {
                debug!(
                    step,
                    from = self.tracker.states().state_name(tr.from),
                    to = self.tracker.states().state_name(tr.to),
                    "transition"
                );
            }
            self.current = next;
            observed += 1;

            if self.config.progress_interval > 0 && step % self.config.progress_interval == 0 {
                let tables = self.tracker.tables();
                info!(
                    step,
                    transitions = tables.total_transitions(),
                    flux_events = tables.total_flux_events(),
                    "progress"
                );
            }
        }

        match stop {
            StopReason::Completed => info!(observed, "run completed"),
            _ => warn!(observed, requested = n_steps, ?stop, "run stopped early"),
        }

        Ok(RunOutcome { requested: n_steps, observed, stop })
    }

    fn observe(&mut self, config: &S::Config, step: u64) -> Result<Observation> {
        let key = match (&self.cache, &self.cache_key) {
            (Some(_), Some(key_fn)) => Some(key_fn(config)),
            _ => None,
        };

        let cached: Option<Membership> = match (key, self.cache.as_mut()) {
            (Some(k), Some(cache)) => cache.get(k).cloned(),
            _ => None,
        };

        let membership = match cached {
            Some(m) => m,
            None => {
                let m = self.tracker.membership(config, step)?;
                if let (Some(k), Some(cache)) = (key, self.cache.as_mut()) {
                    cache.insert(k, m.clone());
                }
                m
            }
        };

        Ok(self.tracker.observe_membership(&membership, step))
    }

    /// Tables and tracker position, for resuming later
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            tables: self.tracker.tables().clone(),
            cursor: self.tracker.cursor(),
        }
    }

    pub fn tables(&self) -> &AccountingTables {
        self.tracker.tables()
    }

    pub fn tracker(&self) -> &FluxTracker<S::Config> {
        &self.tracker
    }

    /// Estimator over the tables as they are now
    pub fn rate_estimator(&self) -> RateEstimator {
        RateEstimator::new(self.tracker.tables())
    }

    pub fn rate_matrix(&self) -> RateMatrix {
        self.rate_estimator().rate_matrix()
    }

    pub fn n_transitions(&self) -> TransitionCounts {
        self.rate_estimator().n_transitions()
    }

    pub fn fluxes(&self) -> BTreeMap<FluxPairKey, f64> {
        self.rate_estimator().fluxes()
    }

    pub fn n_flux_events(&self) -> FluxEventCounts {
        self.rate_estimator().n_flux_events()
    }

    pub fn results(&self) -> Results {
        self.rate_estimator().results()
    }

    /// Configuration most recently observed (the initial one before any step)
    pub fn current(&self) -> &S::Config {
        &self.current
    }

    /// Steps observed across all `run` calls
    pub fn steps_observed(&self) -> u64 {
        self.tracker.tables().total_steps()
    }

    pub fn cache(&self) -> Option<&ClassificationCache> {
        self.cache.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::predicate::CvRange;
    use crate::simulation::{FnSource, ReplaySource};
    use crate::tracker::ConflictPolicy;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn x(c: &f64) -> f64 {
        *c
    }

    fn states() -> StateSet<f64> {
        let mut set = StateSet::new();
        set.add_state("A", CvRange::below(x, -1.0)).unwrap();
        set.add_state("B", CvRange::above(x, 1.0)).unwrap();
        set.add_interface_for("A", "A_0", CvRange::below(x, -0.5)).unwrap();
        set.add_interface_for("B", "B_0", CvRange::above(x, 0.5)).unwrap();
        set
    }

    /// A, out, B, out, A, ... as a 4-periodic sequence
    fn square_wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| [-2.0, 0.0, 2.0, 0.0][i % 4]).collect()
    }

    fn replay(n: usize) -> DirectSimulation<ReplaySource<f64>> {
        let (initial, source) = ReplaySource::from_trajectory(square_wave(n + 1)).unwrap();
        DirectSimulation::new(source, states(), initial, SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_configuration_not_counted() {
        let sim = replay(10);
        assert_eq!(sim.steps_observed(), 0);
        assert_eq!(sim.tables().all_flux_counts()[0].opportunities, 0);
        assert_eq!(*sim.current(), -2.0);
    }

    #[test]
    fn test_run_zero_steps() {
        let mut sim = replay(10);
        let outcome = sim.run(0).unwrap();
        assert_eq!(outcome, RunOutcome { requested: 0, observed: 0, stop: StopReason::Completed });
    }

    #[test]
    fn test_split_runs_accumulate() {
        let mut whole = replay(40);
        whole.run(40).unwrap();

        let mut split = replay(40);
        split.run(13).unwrap();
        split.run(27).unwrap();

        assert_eq!(whole.tables(), split.tables());
        assert_eq!(split.n_transitions().total, 20);
    }

    #[test]
    fn test_exhausted_source() {
        let mut sim = replay(5);
        let outcome = sim.run(8).unwrap();
        assert_eq!(outcome.observed, 5);
        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert!(!outcome.is_complete());
        assert_eq!(sim.steps_observed(), 5);
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let mut sim = replay(5);
        let token = sim.cancel_token();
        token.cancel();
        let outcome = sim.run(5).unwrap();
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert_eq!(outcome.observed, 0);
        token.reset();
        assert!(sim.run(5).unwrap().is_complete());
    }

    #[test]
    fn test_cancel_mid_run_keeps_tables() {
        let slot: Arc<Mutex<Option<CancelToken>>> = Arc::new(Mutex::new(None));
        let engine_slot = Arc::clone(&slot);
        let mut produced = 0;
        let source = FnSource::new(move |_: &f64| {
            produced += 1;
            if produced == 3 {
                if let Some(token) = engine_slot.lock().unwrap().as_ref() {
                    token.cancel();
                }
            }
            Ok(Some(-2.0))
        });
        let mut sim =
            DirectSimulation::new(source, states(), -2.0, SimulationConfig::default()).unwrap();
        *slot.lock().unwrap() = Some(sim.cancel_token());

        let outcome = sim.run(100).unwrap();
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert_eq!(outcome.observed, 3);
        assert_eq!(sim.tables().flux_counts(0).opportunities, 3);
    }

    #[test]
    fn test_engine_failure_keeps_tables() {
        let mut produced = 0;
        let source = FnSource::new(move |_: &f64| {
            produced += 1;
            if produced > 4 {
                Err(Error::engine("integrator blew up"))
            } else {
                Ok(Some(-2.0))
            }
        });
        let mut sim =
            DirectSimulation::new(source, states(), -2.0, SimulationConfig::default()).unwrap();
        assert!(matches!(sim.run(10), Err(Error::Engine(_))));
        assert_eq!(sim.steps_observed(), 4);
        assert_eq!(sim.results().total_steps, 4);
    }

    #[test]
    fn test_conflict_aborts_run() {
        let mut set = StateSet::new();
        set.add_state("low", CvRange::below(x, 0.0)).unwrap();
        set.add_state("lower", CvRange::below(x, -1.0)).unwrap();
        let source = ReplaySource::new(vec![-0.5, -2.0]);
        let mut sim =
            DirectSimulation::new(source, set, -0.5, SimulationConfig::default()).unwrap();
        let err = sim.run(2).unwrap_err();
        assert!(matches!(err, Error::ClassificationConflict { step: 2, .. }));
        assert_eq!(sim.steps_observed(), 1);
    }

    #[test]
    fn test_conflicting_frame_is_not_skipped() {
        let mut set = StateSet::new();
        set.add_state("low", CvRange::below(x, 0.0)).unwrap();
        set.add_state("lower", CvRange::below(x, -1.0)).unwrap();
        let source = ReplaySource::new(vec![-0.5, -2.0, -0.5]);
        let mut sim =
            DirectSimulation::new(source, set, -0.5, SimulationConfig::default()).unwrap();

        assert!(sim.run(3).is_err());
        assert_eq!(sim.source().remaining(), 1);
        // the refused frame comes back first
        let err = sim.run(3).unwrap_err();
        assert!(matches!(err, Error::ClassificationConflict { step: 2, .. }));
        assert_eq!(sim.source().remaining(), 1);
        assert_eq!(sim.steps_observed(), 1);
        assert_eq!(*sim.current(), -0.5);
    }

    #[test]
    fn test_cached_conflicts_are_counted() {
        let mut set = StateSet::new();
        set.add_state("low", CvRange::below(x, 0.0)).unwrap();
        set.add_state("lower", CvRange::below(x, -1.0)).unwrap();
        let source = ReplaySource::new(vec![-2.0, -0.5, -2.0, -0.5, -2.0]);
        let config = SimulationConfig::default()
            .with_conflict_policy(ConflictPolicy::Precedence)
            .with_cache_capacity(4);
        let mut sim = DirectSimulation::new(source, set, -0.5, config)
            .unwrap()
            .with_cache_key(|c: &f64| c.to_bits());
        sim.run(5).unwrap();

        assert_eq!(sim.cache().unwrap().hits(), 3);
        assert_eq!(sim.tracker().resolved_conflicts(), 3);
    }

    #[test]
    fn test_oversized_wall_time_rejected() {
        let config = SimulationConfig { max_wall_time_secs: Some(1e20), ..Default::default() };
        let source = ReplaySource::new(vec![-2.0]);
        let result = DirectSimulation::new(source, states(), -2.0, config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_precedence_policy_from_config() {
        let mut set = StateSet::new();
        set.add_state("low", CvRange::below(x, 0.0)).unwrap();
        set.add_state("lower", CvRange::below(x, -1.0)).unwrap();
        let source = ReplaySource::new(vec![-0.5, -2.0]);
        let config = SimulationConfig::default().with_conflict_policy(ConflictPolicy::Precedence);
        let mut sim = DirectSimulation::new(source, set, -0.5, config).unwrap();
        assert!(sim.run(2).unwrap().is_complete());
        assert_eq!(sim.n_transitions().total, 0);
    }

    #[test]
    fn test_wall_time_budget() {
        let source = FnSource::new(|_: &f64| {
            std::thread::sleep(Duration::from_millis(5));
            Ok(Some(-2.0))
        });
        let config = SimulationConfig::default().with_max_wall_time(Duration::from_millis(20));
        let mut sim = DirectSimulation::new(source, states(), -2.0, config).unwrap();
        let outcome = sim.run(1_000_000).unwrap();
        assert_eq!(outcome.stop, StopReason::TimedOut);
        assert!(outcome.observed > 0 && outcome.observed < 1_000_000);
    }

    #[test]
    fn test_cache_hits_and_same_counts() {
        let frames = square_wave(41);
        let (initial, source) = ReplaySource::from_trajectory(frames.clone()).unwrap();
        let config = SimulationConfig::default().with_cache_capacity(8);
        let mut cached = DirectSimulation::new(source, states(), initial, config)
            .unwrap()
            .with_cache_key(|c: &f64| c.to_bits());
        cached.run(40).unwrap();

        let mut plain = replay(40);
        plain.run(40).unwrap();

        assert_eq!(cached.tables(), plain.tables());
        let cache = cached.cache().unwrap();
        assert_eq!(cache.misses(), 3);
        assert_eq!(cache.hits(), 37);
    }

    #[test]
    fn test_checkpoint_resume() {
        let frames = square_wave(41);

        let mut whole = replay(40);
        whole.run(40).unwrap();

        let mut first = replay(40);
        first.run(17).unwrap();
        let json = first.checkpoint().to_json().unwrap();
        let current = *first.current();

        let rest = ReplaySource::new(frames[18..].to_vec());
        let mut second = DirectSimulation::resume(
            rest,
            states(),
            current,
            Checkpoint::from_json(&json).unwrap(),
            SimulationConfig::default(),
        )
        .unwrap();
        second.run(23).unwrap();

        assert_eq!(second.tables(), whole.tables());
    }

    #[test]
    fn test_corrupt_checkpoint_rejected() {
        let mut first = replay(10);
        first.run(5).unwrap();
        let mut value: serde_json::Value =
            serde_json::from_str(&first.checkpoint().to_json().unwrap()).unwrap();
        value["tables"]["flux"].as_array_mut().unwrap().pop();

        assert!(Checkpoint::from_json(&value.to_string()).is_err());
    }
}
