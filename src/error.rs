//! Error types for direct rate estimation
//!
//! Undefined fluxes and rates are not errors: they are `NaN` / `None`
//! sentinels in the result structures so results can always be read.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Direct-simulation error types
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration satisfied more than one state predicate and no
    /// precedence rule was configured
    #[error("classification conflict at step {step}: configuration is inside states {states:?}")]
    ClassificationConflict {
        /// Step index of the offending configuration
        step: u64,
        /// Names of every state whose predicate matched
        states: Vec<String>,
    },

    /// The trajectory engine failed while producing the next configuration
    #[error("trajectory engine failed: {0}")]
    Engine(String),

    /// A flux pair or lookup named a state that was never declared
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// A lookup named an interface that was never declared
    #[error("unknown interface: {0}")]
    UnknownInterface(String),

    /// Two states or two interfaces share a name
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// Accounting tables from different state/interface layouts were combined
    #[error("incompatible accounting tables: {0}")]
    IncompatibleTables(String),

    /// Simulation configuration rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization of results, checkpoints or config failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap any displayable engine failure
    pub fn engine(err: impl std::fmt::Display) -> Self {
        Self::Engine(err.to_string())
    }
}
