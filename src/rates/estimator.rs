//! Rate estimator over accounting tables

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tracker::{AccountingTables, FluxPairKey};

/// State-to-state rate estimates; `NaN` marks undefined entries
#[derive(Debug, Clone)]
pub struct RateMatrix {
    states: Vec<String>,
    values: Array2<f64>,
}

impl RateMatrix {
    /// Row/column state names
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Raw matrix, rows = source state
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Rate `from → to`, `None` when undefined or either state is unknown
    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        let i = self.states.iter().position(|s| s == from)?;
        let j = self.states.iter().position(|s| s == to)?;
        let v = self.values[[i, j]];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// True when no entry could be estimated
    pub fn is_undefined(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }
}

/// Transition totals, overall and per ordered state pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    pub total: u64,
    pub by_pair: BTreeMap<(String, String), u64>,
}

/// Flux event totals, overall and per flux pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FluxEventCounts {
    pub total: u64,
    pub by_pair: BTreeMap<FluxPairKey, u64>,
}

/// One flux pair in the results bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    pub state: String,
    pub interface: String,
    pub events: u64,
    pub opportunities: u64,
    /// `None` when there was no opportunity
    pub flux: Option<f64>,
}

/// One ordered state pair of the transition table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: String,
    pub to: String,
    pub count: u64,
}

/// One off-diagonal rate matrix entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub from: String,
    pub to: String,
    /// `None` when undefined
    pub rate: Option<f64>,
}

/// Flat, serializable bundle of everything a run has measured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub total_steps: u64,
    pub states: Vec<String>,
    pub n_transitions: u64,
    pub n_flux_events: u64,
    pub fluxes: Vec<FluxRecord>,
    pub transitions: Vec<TransitionRecord>,
    pub rate_matrix: Vec<RateRecord>,
}

impl Results {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rate `from → to` as stored in the bundle
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.rate_matrix
            .iter()
            .find(|r| r.from == from && r.to == to)
            .and_then(|r| r.rate)
    }
}

fn defined(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Derives fluxes and rates from one or more replicas' tables
#[derive(Debug, Clone)]
pub struct RateEstimator {
    tables: AccountingTables,
}

impl RateEstimator {
    /// Estimator over a single run's tables
    pub fn new(tables: &AccountingTables) -> Self {
        Self { tables: tables.clone() }
    }

    /// Estimator over independent replicas sharing one state layout
    pub fn from_replicas<'a, I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a AccountingTables>,
    {
        Ok(Self { tables: AccountingTables::combine(tables)? })
    }

    /// The (combined) tables the estimates derive from
    pub fn tables(&self) -> &AccountingTables {
        &self.tables
    }

    /// Flux per pair; `NaN` where no opportunity was observed
    pub fn fluxes(&self) -> BTreeMap<FluxPairKey, f64> {
        self.tables
            .layout()
            .pairs
            .iter()
            .zip(self.tables.all_flux_counts())
            .map(|(key, counts)| (key.clone(), counts.ratio()))
            .collect()
    }

    /// Flux of one pair; `None` for an unknown pair, `NaN` when undefined
    pub fn flux(&self, state: &str, interface: &str) -> Option<f64> {
        self.tables
            .flux_counts_for(state, interface)
            .map(|c| c.ratio())
    }

    /// Probability that a trajectory leaving `from` reaches `to` first
    ///
    /// Row-normalized transition counts; `NaN` with no outgoing transitions.
    pub fn transition_probabilities(&self) -> Array2<f64> {
        let counts = self.tables.transitions();
        let n = counts.nrows();
        let mut probs = Array2::from_elem((n, n), f64::NAN);
        for i in 0..n {
            let outgoing = self.tables.outgoing_transitions(i);
            if outgoing == 0 {
                continue;
            }
            for j in 0..n {
                if i != j {
                    probs[[i, j]] = counts[[i, j]] as f64 / outgoing as f64;
                }
            }
        }
        probs
    }

    /// k(A → B) = Φ(A, I_A) · P(A → B)
    pub fn rate_matrix(&self) -> RateMatrix {
        let layout = self.tables.layout();
        let probs = self.transition_probabilities();
        let n = layout.states.len();
        let mut values = Array2::from_elem((n, n), f64::NAN);

        for (i, state) in layout.states.iter().enumerate() {
            let flux = match layout.primary_pair(state) {
                Some(k) => self.tables.flux_counts(k).ratio(),
                None => continue,
            };
            for j in 0..n {
                if i != j {
                    // NaN propagates from either factor
                    values[[i, j]] = flux * probs[[i, j]];
                }
            }
        }

        RateMatrix { states: layout.states.clone(), values }
    }

    pub fn n_transitions(&self) -> TransitionCounts {
        let layout = self.tables.layout();
        let counts = self.tables.transitions();
        let mut by_pair = BTreeMap::new();
        for (i, from) in layout.states.iter().enumerate() {
            for (j, to) in layout.states.iter().enumerate() {
                if i != j {
                    by_pair.insert((from.clone(), to.clone()), counts[[i, j]]);
                }
            }
        }
        TransitionCounts { total: self.tables.total_transitions(), by_pair }
    }

    pub fn n_flux_events(&self) -> FluxEventCounts {
        let by_pair = self
            .tables
            .layout()
            .pairs
            .iter()
            .zip(self.tables.all_flux_counts())
            .map(|(key, counts)| (key.clone(), counts.events))
            .collect();
        FluxEventCounts { total: self.tables.total_flux_events(), by_pair }
    }

    /// Everything above, flattened for persistence
    pub fn results(&self) -> Results {
        let layout = self.tables.layout();
        let matrix = self.rate_matrix();

        let fluxes = layout
            .pairs
            .iter()
            .zip(self.tables.all_flux_counts())
            .map(|(key, counts)| FluxRecord {
                state: key.state.clone(),
                interface: key.interface.clone(),
                events: counts.events,
                opportunities: counts.opportunities,
                flux: defined(counts.ratio()),
            })
            .collect();

        let mut transitions = Vec::new();
        let mut rate_matrix = Vec::new();
        for (i, from) in layout.states.iter().enumerate() {
            for (j, to) in layout.states.iter().enumerate() {
                if i == j {
                    continue;
                }
                transitions.push(TransitionRecord {
                    from: from.clone(),
                    to: to.clone(),
                    count: self.tables.transitions()[[i, j]],
                });
                rate_matrix.push(RateRecord {
                    from: from.clone(),
                    to: to.clone(),
                    rate: defined(matrix.values()[[i, j]]),
                });
            }
        }

        Results {
            total_steps: self.tables.total_steps(),
            states: layout.states.clone(),
            n_transitions: self.tables.total_transitions(),
            n_flux_events: self.tables.total_flux_events(),
            fluxes,
            transitions,
            rate_matrix,
        }
    }
}
