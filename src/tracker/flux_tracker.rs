//! Flux/transition tracker: streaming state classification
//!
//! Per step:
//!
//! 1. Classify the configuration against every state (at most one match,
//!    unless a precedence policy resolves the conflict)
//! 2. Entering state S with `last_state = A ≠ S` confirms a transition A → S;
//!    then `last_state = S`
//! 3. Every flux pair (A, I) with `last_state = A` gains one opportunity, and
//!    one event if the trajectory left I's volume between the previous and
//!    the current configuration
//! 4. One more elapsed step
//!
//! Interface membership of the previous configuration is remembered as one
//! flag per pair, so configurations are never retained.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::events::{CrossingEvent, Direction, Observation, TransitionEvent};
use super::states::{ConflictPolicy, PairId, StateId, StateSet};
use super::tables::AccountingTables;
use crate::error::{Error, Result};

/// Predicate outcomes for one configuration
///
/// `interfaces[k]` is the interface membership of flux pair `k`.
/// `conflicted` marks a configuration inside several states whose state
/// was settled by precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub state: Option<StateId>,
    pub interfaces: Vec<bool>,
    pub conflicted: bool,
}

/// Serializable tracker position, enough to continue counting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerCursor {
    pub last_state: Option<StateId>,
    pub in_state: bool,
    pub prev_inside: Vec<bool>,
    pub step: u64,
}

/// Converts a configuration stream into flux and transition counts
pub struct FluxTracker<C: ?Sized> {
    states: StateSet<C>,
    policy: ConflictPolicy,
    /// Most recently visited named state
    last_state: Option<StateId>,
    /// Is the current configuration inside a named state?
    in_state: bool,
    /// Interface membership of the previous configuration, per pair
    prev_inside: Vec<bool>,
    /// Index of the most recently classified configuration
    step: u64,
    /// Conflicts settled by precedence
    resolved_conflicts: u64,
    tables: AccountingTables,
}

impl<C: ?Sized> FluxTracker<C> {
    /// Tracker over `states` with zeroed tables
    pub fn new(states: StateSet<C>, policy: ConflictPolicy) -> Result<Self> {
        states.validate()?;
        let tables = AccountingTables::new(states.layout());
        let n_pairs = states.pairs().len();
        Ok(Self {
            states,
            policy,
            last_state: None,
            in_state: false,
            prev_inside: vec![false; n_pairs],
            step: 0,
            resolved_conflicts: 0,
            tables,
        })
    }

    /// State containing `config`, applying the conflict policy
    pub fn classify(&mut self, config: &C, step: u64) -> Result<Option<StateId>> {
        let (found, conflicted) = self.match_states(config, step)?;
        if conflicted {
            self.note_resolved(found, step);
        }
        Ok(found)
    }

    /// First matching state and whether later states matched too
    fn match_states(&self, config: &C, step: u64) -> Result<(Option<StateId>, bool)> {
        let mut found: Option<StateId> = None;
        let mut conflict: Vec<StateId> = Vec::new();

        for (i, state) in self.states.states().iter().enumerate() {
            if state.contains(config) {
                match found {
                    None => found = Some(StateId(i)),
                    Some(first) => {
                        if conflict.is_empty() {
                            conflict.push(first);
                        }
                        conflict.push(StateId(i));
                    }
                }
            }
        }

        if !conflict.is_empty() && self.policy == ConflictPolicy::Fail {
            return Err(Error::ClassificationConflict {
                step,
                states: conflict
                    .iter()
                    .map(|&id| self.states.state_name(id).to_string())
                    .collect(),
            });
        }
        Ok((found, !conflict.is_empty()))
    }

    fn note_resolved(&mut self, chosen: Option<StateId>, step: u64) {
        if self.resolved_conflicts == 0 {
            if let Some(id) = chosen {
                warn!(
                    step,
                    chosen = self.states.state_name(id),
                    "configuration inside several states; resolving by declaration order"
                );
            }
        }
        self.resolved_conflicts += 1;
    }

    /// Evaluate every state and interface predicate on `config`
    ///
    /// Pure with respect to the tracker; resolved conflicts are counted when
    /// the membership is observed.
    pub fn membership(&self, config: &C, step: u64) -> Result<Membership> {
        let (state, conflicted) = self.match_states(config, step)?;
        let interfaces = self
            .states
            .pairs()
            .iter()
            .map(|pair| self.states.interfaces()[pair.interface].contains(config))
            .collect();
        Ok(Membership { state, interfaces, conflicted })
    }

    /// Seed `last_state`/`in_state` and interface memory from the initial
    /// configuration without counting anything
    pub fn seed(&mut self, config: &C) -> Result<()> {
        let membership = self.membership(config, 0)?;
        self.seed_membership(&membership);
        Ok(())
    }

    /// [`seed`](Self::seed) with predicates already evaluated
    pub fn seed_membership(&mut self, membership: &Membership) {
        if membership.conflicted {
            self.note_resolved(membership.state, 0);
        }
        if membership.state.is_some() {
            self.last_state = membership.state;
        }
        self.in_state = membership.state.is_some();
        self.prev_inside.copy_from_slice(&membership.interfaces);
        self.step = 0;
    }

    /// Classify the configuration at `step` and update the tables
    ///
    /// On `ClassificationConflict` nothing is recorded.
    pub fn observe(&mut self, config: &C, step: u64) -> Result<Observation> {
        let membership = self.membership(config, step)?;
        Ok(self.observe_membership(&membership, step))
    }

    /// [`observe`](Self::observe) with predicates already evaluated
    pub fn observe_membership(&mut self, membership: &Membership, step: u64) -> Observation {
        if membership.conflicted {
            self.note_resolved(membership.state, step);
        }
        let current = membership.state;
        let mut observation = Observation { state: current, ..Observation::default() };

        if let Some(s) = current {
            if let Some(a) = self.last_state {
                if a != s {
                    self.tables.record_transition(a.0, s.0);
                    observation.transition = Some(TransitionEvent { from: a, to: s, step });
                }
            }
            self.last_state = Some(s);
        }
        self.in_state = current.is_some();

        for (k, pair) in self.states.pairs().iter().enumerate() {
            let inside = membership.interfaces[k];
            let was_inside = self.prev_inside[k];
            self.prev_inside[k] = inside;

            if self.last_state != Some(pair.state) {
                continue;
            }
            let outward = was_inside && !inside;
            self.tables.record_opportunity(k, outward);

            if was_inside != inside {
                let direction = if outward { Direction::Outward } else { Direction::Inward };
                trace!(step, pair = k, ?direction, "interface crossing");
                observation.crossings.push(CrossingEvent { pair: PairId(k), direction, step });
            }
        }

        self.tables.record_step();
        self.step = step;
        observation
    }

    pub fn tables(&self) -> &AccountingTables {
        &self.tables
    }

    pub fn states(&self) -> &StateSet<C> {
        &self.states
    }

    pub fn last_state(&self) -> Option<StateId> {
        self.last_state
    }

    pub fn in_state(&self) -> bool {
        self.in_state
    }

    /// Index of the most recently classified configuration
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn resolved_conflicts(&self) -> u64 {
        self.resolved_conflicts
    }

    /// Snapshot of the tracker position
    pub fn cursor(&self) -> TrackerCursor {
        TrackerCursor {
            last_state: self.last_state,
            in_state: self.in_state,
            prev_inside: self.prev_inside.clone(),
            step: self.step,
        }
    }

    /// Continue from a previous position and its tables
    pub fn restore(&mut self, cursor: TrackerCursor, tables: AccountingTables) -> Result<()> {
        tables.check_consistent()?;
        if tables.layout() != self.tables.layout() {
            return Err(Error::IncompatibleTables(
                "checkpoint layout does not match the declared states".into(),
            ));
        }
        if cursor.prev_inside.len() != self.prev_inside.len()
            || cursor.last_state.is_some_and(|s| s.0 >= self.states.n_states())
        {
            return Err(Error::IncompatibleTables(
                "checkpoint cursor does not match the declared states".into(),
            ));
        }
        self.last_state = cursor.last_state;
        self.in_state = cursor.in_state;
        self.prev_inside = cursor.prev_inside;
        self.step = cursor.step;
        self.tables = tables;
        Ok(())
    }
}
