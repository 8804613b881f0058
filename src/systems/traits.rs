//! Dynamical System Traits: Standardized Engine API
//!
//! Engines implementing these traits can drive a direct simulation through
//! [`SystemSource`](crate::simulation::SystemSource).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    DynamicalSystem Trait                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  + step()              - Advance system by dt               │
//! │  + run(n)              - Run n steps                        │
//! │  + state()             - Snapshot of the configuration      │
//! │  + n_elements()        - Particles/degrees of freedom       │
//! │  + order_parameter()   - Reaction coordinate                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

/// Trait for engines that advance a configuration one step at a time
pub trait DynamicalSystem {
    /// Configuration snapshot type
    type State;

    /// Advance system by one timestep
    fn step(&mut self);

    /// Run multiple timesteps
    fn run(&mut self, n_steps: usize) {
        for _ in 0..n_steps {
            self.step();
        }
    }

    /// Get current state snapshot
    fn state(&self) -> Self::State;

    /// Number of elements/particles/coordinates
    fn n_elements(&self) -> usize;

    /// System-specific reaction coordinate
    fn order_parameter(&self) -> f64;
}

/// Trait for systems with controllable parameters
pub trait Controllable {
    /// Parameter type (temperature, coupling, ...)
    type Parameter;

    /// Set control parameter
    fn set_parameter(&mut self, param: Self::Parameter);

    /// Get current parameter value
    fn get_parameter(&self) -> Self::Parameter;

    /// Ramp parameter gradually
    fn ramp_parameter(&mut self, target: Self::Parameter, rate: f64, steps_per_increment: usize);
}
