//! Tracker Module: Flux and Transition Counting
//!
//! Streams configurations through the state/interface predicates and keeps
//! the counting tables needed for direct rate estimation:
//!
//! - **Flux counts**: for each flux pair (A, I), outward crossings of I and
//!   the number of steps during which A was the last visited state
//! - **Transition counts**: confirmed changes of the last visited state
//!   A → B between two named states
//! - **Elapsed steps**
//!
//! The flux of (A, I) is the first-crossing estimator
//!
//!   Φ(A, I) = N_cross(A, I) / N_steps(last = A)
//!
//! Work per configuration is O(states + pairs), independent of run length.

mod events;
mod flux_tracker;
mod states;
mod tables;

pub use events::{CrossingEvent, Direction, Observation, TransitionEvent};
pub use flux_tracker::{FluxTracker, Membership, TrackerCursor};
pub use states::{
    ConflictPolicy,
    FluxPair,
    FluxPairKey,
    Interface,
    PairId,
    State,
    StateId,
    StateSet,
    TableLayout,
};
pub use tables::{AccountingTables, FluxCounts};
