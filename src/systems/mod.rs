//! Physical Systems Module: Trajectory Engines
//!
//! Reference dynamics for direct rate estimation:
//!
//! - **Double well**: two metastable basins, one barrier
//! - **Triple well**: three basins in a row, exercising branching
//!   transition probabilities
//!
//! Both are overdamped Langevin particles with seeded noise.

mod traits;
mod langevin;

pub use traits::{DynamicalSystem, Controllable};
pub use langevin::{Potential, DoubleWell, TripleWell, LangevinSystem, LangevinState};
