//! Rates Module: Flux, Conditional Transition Probability and Rate Matrix
//!
//! Pure functions of finished (or in-progress) accounting tables:
//!
//!   Φ(A)       = N_cross(A, I_A) / N_steps(last = A)
//!   P(A → B)   = N(A → B) / Σ_{C≠A} N(A → C)
//!   k(A → B)   = Φ(A) · P(A → B)
//!
//! where I_A is the first interface declared for A. Quantities with a zero
//! denominator are undefined (`NaN` in matrices, `None` in `Results`).

mod estimator;

pub use estimator::{
    FluxEventCounts,
    FluxRecord,
    RateEstimator,
    RateMatrix,
    RateRecord,
    Results,
    TransitionCounts,
    TransitionRecord,
};
