//! # Direct Rate Dynamics
//!
//! Reaction rates between metastable states from brute-force ("direct")
//! trajectory simulation, as an independent benchmark for path-sampling
//! estimates.
//!
//! ## Method
//!
//! A single long trajectory is classified step by step against a set of
//! named states (basins) and interfaces (escape surfaces paired with a
//! state). Three statistics accumulate:
//!
//! 1. **Interface flux**: outward crossings of interface I per step spent
//!    having last visited state A
//!
//!      Φ(A, I) = N_cross(A, I) / N_steps(last = A)
//!
//! 2. **Transition counts**: confirmed changes of the last visited state,
//!    A → B, between named states
//!
//! 3. **Rate matrix**: flux out of A times the probability of reaching B
//!    before any other state
//!
//!      k(A → B) = Φ(A, I_A) · N(A → B) / Σ_{C≠A} N(A → C)
//!
//! Quantities with a zero denominator are undefined rather than errors,
//! so results can be read at any point of a run.
//!
//! ## Architecture
//!
//! ```text
//! predicate ──▶ tracker ──▶ rates
//!                  ▲
//! systems ──▶ simulation (driver, sources, checkpoints)
//! ```
//!
//! ## References
//!
//! - van Erp, Moroni & Bolhuis, J. Chem. Phys. 118, 7762 (2003) - TIS flux
//! - Kramers, Physica 7, 284 (1940) - Escape rates over barriers

pub mod error;
pub mod predicate;
pub mod tracker;
pub mod rates;
pub mod simulation;
pub mod systems;

pub use error::{Error, Result};

// Re-exports from predicate
pub use predicate::{
    Predicate,
    PredicateExt,
    BoxedPredicate,
    CollectiveVariable,
    NamedCv,
    CvRange,
    BoxRegion,
    Composite,
    Everywhere,
    Nowhere,
};

// Re-exports from tracker
pub use tracker::{
    AccountingTables,
    ConflictPolicy,
    CrossingEvent,
    Direction,
    FluxCounts,
    FluxPairKey,
    FluxTracker,
    Observation,
    StateId,
    StateSet,
    TransitionEvent,
};

// Re-exports from rates
pub use rates::{
    RateEstimator,
    RateMatrix,
    Results,
};

// Re-exports from simulation
pub use simulation::{
    CancelToken,
    Checkpoint,
    DirectSimulation,
    FnSource,
    ReplaySource,
    RunOutcome,
    SimulationConfig,
    StopReason,
    SystemSource,
    TrajectorySource,
};

// Re-exports from systems
pub use systems::{
    // Traits
    DynamicalSystem,
    Controllable,
    Potential,
    // Langevin engines
    LangevinSystem,
    LangevinState,
    DoubleWell,
    TripleWell,
};
