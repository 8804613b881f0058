//! Named states, interfaces and flux pairs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::predicate::{BoxedPredicate, Predicate};

/// Index of a state in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub usize);

/// Index of a flux pair in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub usize);

/// What to do when a configuration is inside more than one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Abort the run with `Error::ClassificationConflict`
    #[default]
    Fail,
    /// Pick the earliest declared state
    Precedence,
}

/// A metastable basin
pub struct State<C: ?Sized> {
    name: String,
    volume: BoxedPredicate<C>,
}

impl<C: ?Sized> State<C> {
    /// State name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is `config` inside this state?
    pub fn contains(&self, config: &C) -> bool {
        self.volume.test(config)
    }
}

/// Threshold surface bounding one state, represented by the volume on its
/// state side (inside = `true`)
pub struct Interface<C: ?Sized> {
    name: String,
    volume: BoxedPredicate<C>,
}

impl<C: ?Sized> Interface<C> {
    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is `config` on the state side of the interface?
    pub fn contains(&self, config: &C) -> bool {
        self.volume.test(config)
    }
}

/// Name-level identity of a flux pair, used in tables and results
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FluxPairKey {
    /// State the trajectory must have last visited
    pub state: String,
    /// Interface whose outward crossings are counted
    pub interface: String,
}

impl FluxPairKey {
    pub fn new(state: impl Into<String>, interface: impl Into<String>) -> Self {
        Self { state: state.into(), interface: interface.into() }
    }
}

impl fmt::Display for FluxPairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.state, self.interface)
    }
}

/// A (state, interface) combination whose crossing rate is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluxPair {
    pub state: StateId,
    pub interface: usize,
}

/// State and interface definitions, immutable once a run starts
///
/// Declaration order of states is the precedence order used by
/// [`ConflictPolicy::Precedence`].
pub struct StateSet<C: ?Sized> {
    states: Vec<State<C>>,
    interfaces: Vec<Interface<C>>,
    pairs: Vec<FluxPair>,
}

impl<C: ?Sized> StateSet<C> {
    /// Empty definition set
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            interfaces: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Declare a state
    pub fn add_state<P>(&mut self, name: impl Into<String>, volume: P) -> Result<StateId>
    where
        P: Predicate<C> + 'static,
    {
        let name = name.into();
        if self.states.iter().any(|s| s.name == name) {
            return Err(Error::DuplicateName(name));
        }
        self.states.push(State { name, volume: Box::new(volume) });
        Ok(StateId(self.states.len() - 1))
    }

    /// Declare an interface and pair it with `state`
    ///
    /// Convenience for [`add_interface`](Self::add_interface) followed by
    /// [`add_flux_pair`](Self::add_flux_pair).
    pub fn add_interface_for<P>(
        &mut self,
        state: &str,
        name: impl Into<String>,
        volume: P,
    ) -> Result<PairId>
    where
        P: Predicate<C> + 'static,
    {
        let name = name.into();
        self.add_interface(name.clone(), volume)?;
        self.add_flux_pair(state, &name)
    }

    /// Declare an interface without pairing it
    pub fn add_interface<P>(&mut self, name: impl Into<String>, volume: P) -> Result<usize>
    where
        P: Predicate<C> + 'static,
    {
        let name = name.into();
        if self.interfaces.iter().any(|i| i.name == name) {
            return Err(Error::DuplicateName(name));
        }
        self.interfaces.push(Interface { name, volume: Box::new(volume) });
        Ok(self.interfaces.len() - 1)
    }

    /// Track the flux of `state` through `interface`
    pub fn add_flux_pair(&mut self, state: &str, interface: &str) -> Result<PairId> {
        let state = self
            .state_id(state)
            .ok_or_else(|| Error::UnknownState(state.to_string()))?;
        let interface = self
            .interfaces
            .iter()
            .position(|i| i.name == interface)
            .ok_or_else(|| Error::UnknownInterface(interface.to_string()))?;
        let pair = FluxPair { state, interface };
        if self.pairs.contains(&pair) {
            return Err(Error::DuplicateName(format!(
                "flux pair ({}, {})",
                self.states[state.0].name, self.interfaces[interface].name
            )));
        }
        self.pairs.push(pair);
        Ok(PairId(self.pairs.len() - 1))
    }

    /// Look up a state by name
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|s| s.name == name).map(StateId)
    }

    pub fn states(&self) -> &[State<C>] {
        &self.states
    }

    pub fn interfaces(&self) -> &[Interface<C>] {
        &self.interfaces
    }

    pub fn pairs(&self) -> &[FluxPair] {
        &self.pairs
    }

    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Name of a state
    pub fn state_name(&self, id: StateId) -> &str {
        &self.states[id.0].name
    }

    /// Name-level key of a flux pair
    pub fn pair_key(&self, id: PairId) -> FluxPairKey {
        let pair = self.pairs[id.0];
        FluxPairKey::new(
            self.states[pair.state.0].name.clone(),
            self.interfaces[pair.interface].name.clone(),
        )
    }

    /// Layout describing the tables this definition set produces
    pub fn layout(&self) -> TableLayout {
        TableLayout {
            states: self.states.iter().map(|s| s.name.clone()).collect(),
            pairs: (0..self.pairs.len()).map(|k| self.pair_key(PairId(k))).collect(),
        }
    }

    /// Reject definition sets that cannot produce any statistics
    pub fn validate(&self) -> Result<()> {
        if self.states.is_empty() {
            return Err(Error::InvalidConfig("no states declared".into()));
        }
        Ok(())
    }
}

impl<C: ?Sized> Default for StateSet<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// State names and flux pairs, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub states: Vec<String>,
    pub pairs: Vec<FluxPairKey>,
}

impl TableLayout {
    /// Index of a state by name
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s == name)
    }

    /// Index of a flux pair by names
    pub fn pair_index(&self, state: &str, interface: &str) -> Option<usize> {
        self.pairs
            .iter()
            .position(|p| p.state == state && p.interface == interface)
    }

    /// First declared flux pair of `state`, used as its escape interface
    pub fn primary_pair(&self, state: &str) -> Option<usize> {
        self.pairs.iter().position(|p| p.state == state)
    }
}
