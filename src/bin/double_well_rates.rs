//! Double Well Direct Rates: Brute-Force Kramers Benchmark
//!
//! Runs one long overdamped Langevin trajectory in a symmetric double well
//! and estimates the A → B and B → A rates by direct flux/transition
//! counting. Compares against the Kramers high-barrier estimate.
//!
//! ## Usage
//!
//!   double_well_rates [results.json]
//!
//! Set `RUST_LOG=debug` to see individual transitions.

use std::f64::consts::PI;

use ndarray::array;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use direct_rates::{
    CvRange,
    DirectSimulation,
    DoubleWell,
    LangevinState,
    LangevinSystem,
    SimulationConfig,
    StateSet,
    SystemSource,
};

fn x(s: &LangevinState) -> f64 {
    s.x()
}

fn main() -> direct_rates::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Direct Simulation: Double Well Rates");
    println!("═══════════════════════════════════════════════════════════════\n");

    // System parameters
    let barrier = 2.0;
    let temperature = 0.5;
    let dt = 1e-3;
    let stride = 10;        // integration steps per observed frame
    let n_chunks = 10;
    let frames_per_chunk = 20_000;
    let seed = 2024;

    println!("System Parameters:");
    println!("  V(x) = h (x² - 1)², h = {:.2}", barrier);
    println!("  kT = {:.2} (h/kT = {:.1})", temperature, barrier / temperature);
    println!("  dt = {}, frame = {} steps", dt, stride);
    println!();

    let system = LangevinSystem::new(DoubleWell::new(barrier), array![-1.0], temperature, seed)
        .with_dt(dt);
    let source = SystemSource::new(system).with_stride(stride);
    let initial = source.initial();

    let mut states = StateSet::new();
    states.add_state("A", CvRange::below(x, -0.7))?;
    states.add_state("B", CvRange::above(x, 0.7))?;
    states.add_interface_for("A", "A_0", CvRange::below(x, -0.5))?;
    states.add_interface_for("B", "B_0", CvRange::above(x, 0.5))?;

    let config = SimulationConfig::default().with_progress_interval(50_000);
    let mut sim = DirectSimulation::new(source, states, initial, config)?;

    println!("Running {} × {} frames...", n_chunks, frames_per_chunk);
    for chunk in 0..n_chunks {
        let outcome = sim.run(frames_per_chunk)?;
        let counts = sim.n_transitions();
        println!(
            "  Chunk {:2}: frames = {:7}, transitions = {:4}, flux events = {:5}",
            chunk + 1,
            sim.steps_observed(),
            counts.total,
            sim.n_flux_events().total
        );
        if !outcome.is_complete() {
            println!("  Stopped early: {:?}", outcome.stop);
            break;
        }
    }

    // Final analysis
    println!("\n══════════════════════════════════════════════════════════════");
    println!("  Results");
    println!("══════════════════════════════════════════════════════════════\n");

    let frame_time = dt * stride as f64;
    for (pair, flux) in sim.fluxes() {
        println!(
            "  Flux {}: {:.5} per frame = {:.5} per time unit",
            pair,
            flux,
            flux / frame_time
        );
    }

    let rates = sim.rate_matrix();
    let kramers = {
        let omega_well = (8.0 * barrier).sqrt();
        let omega_barrier = (4.0 * barrier).sqrt();
        omega_well * omega_barrier / (2.0 * PI) * (-barrier / temperature).exp()
    };

    for (from, to) in [("A", "B"), ("B", "A")] {
        match rates.get(from, to) {
            Some(k) => println!(
                "  k({} → {}) = {:.3e} per time unit (Kramers ≈ {:.3e})",
                from,
                to,
                k / frame_time,
                kramers
            ),
            None => println!("  k({} → {}) undefined: no transitions observed", from, to),
        }
    }

    if let Some(path) = std::env::args().nth(1) {
        std::fs::write(&path, sim.results().to_json_pretty()?)?;
        println!("\n  Results written to {}", path);
    }

    println!("\n═══════════════════════════════════════════════════════════════");
    println!("  Analysis Complete");
    println!("═══════════════════════════════════════════════════════════════");

    Ok(())
}
