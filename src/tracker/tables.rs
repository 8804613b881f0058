//! Accounting tables: flux counts, transition counts, elapsed steps
//!
//! Append-only while a run is in progress. Tables from independent
//! replicas with the same layout can be summed.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::states::TableLayout;
use crate::error::{Error, Result};

/// Crossing events and crossing opportunities of one flux pair
///
/// Invariant: `opportunities ≥ events`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxCounts {
    /// Outward interface crossings while the pair's state was last visited
    pub events: u64,
    /// Steps observed while the pair's state was last visited
    pub opportunities: u64,
}

impl FluxCounts {
    /// `events / opportunities`, `NaN` when there was no opportunity
    pub fn ratio(&self) -> f64 {
        if self.opportunities == 0 {
            f64::NAN
        } else {
            self.events as f64 / self.opportunities as f64
        }
    }
}

/// Counting tables accumulated by a tracker
///
/// Deserialization checks that the counts match the layout's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTables")]
pub struct AccountingTables {
    layout: TableLayout,
    flux: Vec<FluxCounts>,
    /// transitions[[from, to]]
    transitions: Array2<u64>,
    total_steps: u64,
}

#[derive(Deserialize)]
struct RawTables {
    layout: TableLayout,
    flux: Vec<FluxCounts>,
    transitions: Array2<u64>,
    total_steps: u64,
}

impl TryFrom<RawTables> for AccountingTables {
    type Error = Error;

    fn try_from(raw: RawTables) -> Result<Self> {
        let tables = Self {
            layout: raw.layout,
            flux: raw.flux,
            transitions: raw.transitions,
            total_steps: raw.total_steps,
        };
        tables.check_consistent()?;
        Ok(tables)
    }
}

impl AccountingTables {
    /// Zeroed tables for `layout`
    pub fn new(layout: TableLayout) -> Self {
        let n = layout.states.len();
        let flux = vec![FluxCounts::default(); layout.pairs.len()];
        Self {
            layout,
            flux,
            transitions: Array2::zeros((n, n)),
            total_steps: 0,
        }
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Check that the counts have the layout's shape and that no pair has
    /// more events than opportunities
    pub fn check_consistent(&self) -> Result<()> {
        let n = self.layout.states.len();
        if self.flux.len() != self.layout.pairs.len() {
            return Err(Error::IncompatibleTables(format!(
                "{} flux records for {} flux pairs",
                self.flux.len(),
                self.layout.pairs.len()
            )));
        }
        if self.transitions.dim() != (n, n) {
            return Err(Error::IncompatibleTables(format!(
                "transition matrix is {:?}, expected ({n}, {n})",
                self.transitions.dim()
            )));
        }
        if let Some(k) = self.flux.iter().position(|c| c.events > c.opportunities) {
            return Err(Error::IncompatibleTables(format!(
                "pair {} has more events than opportunities",
                self.layout.pairs[k]
            )));
        }
        Ok(())
    }

    pub(crate) fn record_opportunity(&mut self, pair: usize, crossed: bool) {
        let counts = &mut self.flux[pair];
        counts.opportunities += 1;
        if crossed {
            counts.events += 1;
        }
    }

    pub(crate) fn record_transition(&mut self, from: usize, to: usize) {
        debug_assert_ne!(from, to, "self-transitions are not transitions");
        self.transitions[[from, to]] += 1;
    }

    pub(crate) fn record_step(&mut self) {
        self.total_steps += 1;
    }

    /// Counts of flux pair `pair` (declaration index)
    pub fn flux_counts(&self, pair: usize) -> FluxCounts {
        self.flux[pair]
    }

    /// Counts of the flux pair named `(state, interface)`
    pub fn flux_counts_for(&self, state: &str, interface: &str) -> Option<FluxCounts> {
        self.layout
            .pair_index(state, interface)
            .map(|k| self.flux[k])
    }

    /// All flux counts in pair declaration order
    pub fn all_flux_counts(&self) -> &[FluxCounts] {
        &self.flux
    }

    /// Transition count matrix, rows = source state
    pub fn transitions(&self) -> &Array2<u64> {
        &self.transitions
    }

    /// Number of confirmed `from → to` transitions
    pub fn transition_count(&self, from: &str, to: &str) -> Option<u64> {
        let i = self.layout.state_index(from)?;
        let j = self.layout.state_index(to)?;
        Some(self.transitions[[i, j]])
    }

    /// Transitions out of state `from` to any other named state
    pub fn outgoing_transitions(&self, from: usize) -> u64 {
        self.transitions.row(from).sum()
    }

    pub fn total_transitions(&self) -> u64 {
        self.transitions.sum()
    }

    pub fn total_flux_events(&self) -> u64 {
        self.flux.iter().map(|c| c.events).sum()
    }

    /// Configurations observed, excluding the initial one
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Add another replica's counts into these tables
    pub fn merge(&mut self, other: &AccountingTables) -> Result<()> {
        self.check_consistent()?;
        other.check_consistent()?;
        if self.layout != other.layout {
            return Err(Error::IncompatibleTables(format!(
                "layouts differ: states {:?} vs {:?}",
                self.layout.states, other.layout.states
            )));
        }
        for (mine, theirs) in self.flux.iter_mut().zip(other.flux.iter()) {
            mine.events += theirs.events;
            mine.opportunities += theirs.opportunities;
        }
        self.transitions += &other.transitions;
        self.total_steps += other.total_steps;
        Ok(())
    }

    /// Sum of several replicas' tables
    pub fn combine<'a, I>(tables: I) -> Result<AccountingTables>
    where
        I: IntoIterator<Item = &'a AccountingTables>,
    {
        let mut iter = tables.into_iter();
        let mut total = iter
            .next()
            .cloned()
            .ok_or_else(|| Error::IncompatibleTables("no tables to combine".into()))?;
        for t in iter {
            total.merge(t)?;
        }
        Ok(total)
    }
}
