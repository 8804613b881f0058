//! Predicate Module: State and Interface Membership Tests
//!
//! States and interfaces are regions of configuration space described by
//! a boolean membership test evaluated once per trajectory step:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   Predicate<C>                             │
//! ├───────────────────────────────────────────────────────────┤
//! │  CvRange     - λ_min ≤ cv(x) < λ_max (order parameter)     │
//! │  BoxRegion   - axis-aligned box in projected coordinates   │
//! │  Composite   - And / Or / Not over other predicates        │
//! │  Everywhere / Nowhere                                      │
//! │  closures    - any Fn(&C) -> bool                          │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Collective variables map a configuration to a scalar and are the usual
//! building block for `CvRange`.

mod cv;
mod volume;

pub use cv::{CollectiveVariable, NamedCv};
pub use volume::{
    BoxRegion,
    BoxedPredicate,
    Composite,
    CvRange,
    Everywhere,
    Nowhere,
    Predicate,
    PredicateExt,
};
