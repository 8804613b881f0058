//! Overdamped Langevin Dynamics in Multi-Well Potentials
//!
//! Brownian particle in a potential V(x), integrated with Euler–Maruyama:
//!
//!   x(t + dt) = x(t) - (dt/γ) ∇V(x) + √(2 kT dt / γ) ξ,   ξ ~ N(0, 1)
//!
//! The first coordinate is the reaction coordinate; any further coordinates
//! are confined by a harmonic term ½ κ Σ_{d≥1} x_d².
//!
//! ## Metastability
//!
//! With barrier height h ≫ kT the particle rattles inside one well and
//! hops rarely, with Kramers rate k ∝ exp(-h / kT). These are the
//! reference systems for direct rate estimation.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::traits::{Controllable, DynamicalSystem};

/// Potential energy surface
pub trait Potential: Send + Sync {
    /// V(x)
    fn energy(&self, x: &Array1<f64>) -> f64;

    /// ∇V(x)
    fn gradient(&self, x: &Array1<f64>) -> Array1<f64>;

    /// Reaction-coordinate positions of the well minima
    fn minima(&self) -> Vec<f64>;
}

/// Harmonic confinement of the transverse coordinates
fn transverse_energy(x: &Array1<f64>, stiffness: f64) -> f64 {
    0.5 * stiffness * x.iter().skip(1).map(|v| v * v).sum::<f64>()
}

/// Symmetric double well V = h (x₀² - 1)², minima at x₀ = ±1
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DoubleWell {
    /// Barrier height h at x₀ = 0
    pub barrier: f64,
    /// Transverse spring constant κ
    pub stiffness: f64,
}

impl DoubleWell {
    pub fn new(barrier: f64) -> Self {
        Self { barrier, stiffness: 1.0 }
    }
}

impl Potential for DoubleWell {
    fn energy(&self, x: &Array1<f64>) -> f64 {
        let x0 = x[0];
        self.barrier * (x0 * x0 - 1.0).powi(2) + transverse_energy(x, self.stiffness)
    }

    fn gradient(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut grad = x * self.stiffness;
        let x0 = x[0];
        grad[0] = 4.0 * self.barrier * x0 * (x0 * x0 - 1.0);
        grad
    }

    fn minima(&self) -> Vec<f64> {
        vec![-1.0, 1.0]
    }
}

/// Symmetric triple well V = h (27/256) x₀² (x₀² - 4)², minima at 0, ±2
///
/// Normalized so both barriers (x₀ = ±2/√3) have height h.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TripleWell {
    /// Barrier height h
    pub barrier: f64,
    /// Transverse spring constant κ
    pub stiffness: f64,
}

impl TripleWell {
    const NORM: f64 = 27.0 / 256.0;

    pub fn new(barrier: f64) -> Self {
        Self { barrier, stiffness: 1.0 }
    }
}

impl Potential for TripleWell {
    fn energy(&self, x: &Array1<f64>) -> f64 {
        let x0 = x[0];
        let x2 = x0 * x0;
        self.barrier * Self::NORM * x2 * (x2 - 4.0).powi(2) + transverse_energy(x, self.stiffness)
    }

    fn gradient(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut grad = x * self.stiffness;
        let x0 = x[0];
        let x2 = x0 * x0;
        grad[0] = self.barrier * Self::NORM * 2.0 * x0 * (x2 - 4.0) * (3.0 * x2 - 4.0);
        grad
    }

    fn minima(&self) -> Vec<f64> {
        vec![-2.0, 0.0, 2.0]
    }
}

/// Snapshot of a Langevin particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LangevinState {
    /// Coordinates, reaction coordinate first
    pub position: Array1<f64>,
    /// Potential energy at `position`
    pub potential_energy: f64,
    /// Simulation time
    pub time: f64,
}

impl LangevinState {
    /// Reaction coordinate
    pub fn x(&self) -> f64 {
        self.position[0]
    }
}

/// Overdamped Brownian particle
pub struct LangevinSystem<P> {
    potential: P,
    position: Array1<f64>,
    /// Thermal energy kT
    temperature: f64,
    /// Friction coefficient γ
    friction: f64,
    /// Integration timestep
    dt: f64,
    /// Current time
    time: f64,
    rng: StdRng,
}

impl<P: Potential> LangevinSystem<P> {
    /// Create a particle at `position`
    ///
    /// # Arguments
    /// * `potential` - Energy surface
    /// * `position` - Initial coordinates (reaction coordinate first)
    /// * `temperature` - Thermal energy kT
    /// * `seed` - RNG seed; equal seeds give identical trajectories
    pub fn new(potential: P, position: Array1<f64>, temperature: f64, seed: u64) -> Self {
        Self {
            potential,
            position,
            temperature,
            friction: 1.0,
            dt: 1e-3,
            time: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Set integration timestep
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set friction coefficient γ
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.friction = friction;
        self
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }

    pub fn position(&self) -> &Array1<f64> {
        &self.position
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Move the particle to `state` (continuing a previous run)
    pub fn set_state(&mut self, state: &LangevinState) {
        self.position = state.position.clone();
        self.time = state.time;
    }
}

impl<P: Potential> DynamicalSystem for LangevinSystem<P> {
    type State = LangevinState;

    /// Euler–Maruyama step
    fn step(&mut self) {
        let drift = self.potential.gradient(&self.position) * (-self.dt / self.friction);
        let amplitude = (2.0 * self.temperature * self.dt / self.friction).sqrt();

        for (x, d) in self.position.iter_mut().zip(drift.iter()) {
            let xi: f64 = StandardNormal.sample(&mut self.rng);
            *x += d + amplitude * xi;
        }
        self.time += self.dt;
    }

    fn state(&self) -> LangevinState {
        LangevinState {
            position: self.position.clone(),
            potential_energy: self.potential.energy(&self.position),
            time: self.time,
        }
    }

    fn n_elements(&self) -> usize {
        self.position.len()
    }

    fn order_parameter(&self) -> f64 {
        self.position[0]
    }
}

impl<P: Potential> Controllable for LangevinSystem<P> {
    type Parameter = f64;

    fn set_parameter(&mut self, param: f64) {
        self.temperature = param;
    }

    fn get_parameter(&self) -> f64 {
        self.temperature
    }

    fn ramp_parameter(&mut self, target: f64, rate: f64, steps_per_increment: usize) {
        while (self.temperature - target).abs() > rate {
            self.run(steps_per_increment);
            if self.temperature < target {
                self.temperature += rate;
            } else {
                self.temperature -= rate;
            }
        }
        self.temperature = target;
    }
}
