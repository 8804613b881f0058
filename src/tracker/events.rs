//! Ephemeral per-step events produced by the tracker

use super::states::{PairId, StateId};

/// Direction of an interface crossing relative to the interface's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the state side of the interface to the far side
    Outward,
    /// From the far side back onto the state side
    Inward,
}

/// Successive configurations straddled an interface while its paired
/// state was the last visited state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingEvent {
    pub pair: PairId,
    pub direction: Direction,
    pub step: u64,
}

/// The last visited state changed from one named state to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub from: StateId,
    pub to: StateId,
    pub step: u64,
}

/// Outcome of classifying one configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// State containing the configuration, if any
    pub state: Option<StateId>,
    /// Transition confirmed by this configuration
    pub transition: Option<TransitionEvent>,
    /// Interface crossings between the previous and this configuration
    pub crossings: Vec<CrossingEvent>,
}

impl Observation {
    /// Outward crossings only (the ones counted as flux events)
    pub fn outward_crossings(&self) -> impl Iterator<Item = &CrossingEvent> {
        self.crossings
            .iter()
            .filter(|c| c.direction == Direction::Outward)
    }
}
