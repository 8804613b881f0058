//! Triple Well Direct Rates: Branching Between Three Basins
//!
//! A 2D overdamped Langevin particle in a triple well along x with harmonic
//! confinement along y. The middle basin can escape either way, so its
//! rate-matrix row exercises the conditional transition probabilities.
//!
//! ## Usage
//!
//!   triple_well_rates [results.json] [checkpoint.json]
//!
//! The run is split into chunks; when a checkpoint path is given, a
//! checkpoint is written after each chunk.

use ndarray::{array, Array1};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use direct_rates::{
    BoxRegion,
    CvRange,
    DirectSimulation,
    LangevinState,
    LangevinSystem,
    SimulationConfig,
    StateSet,
    SystemSource,
    TripleWell,
};

fn x(s: &LangevinState) -> f64 {
    s.x()
}

fn coordinates(s: &LangevinState) -> Array1<f64> {
    s.position.clone()
}

fn main() -> direct_rates::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Direct Simulation: Triple Well Rates");
    println!("═══════════════════════════════════════════════════════════════\n");

    let barrier = 1.5;
    let temperature = 0.4;
    let dt = 1e-3;
    let stride = 10;
    let n_chunks = 8;
    let frames_per_chunk = 25_000;
    let seed = 7;

    println!("System Parameters:");
    println!("  Barrier h = {:.2}, kT = {:.2}", barrier, temperature);
    println!("  Wells at x = -2, 0, +2");
    println!();

    let system =
        LangevinSystem::new(TripleWell::new(barrier), array![0.0, 0.0], temperature, seed)
            .with_dt(dt);
    let source = SystemSource::new(system).with_stride(stride);
    let initial = source.initial();

    let mut states = StateSet::new();
    states.add_state("A", CvRange::below(x, -1.7))?;
    states.add_state(
        "B",
        BoxRegion::new(
            coordinates,
            array![-0.3, f64::NEG_INFINITY],
            array![0.3, f64::INFINITY],
        ),
    )?;
    states.add_state("C", CvRange::above(x, 1.7))?;
    states.add_interface_for("A", "A_0", CvRange::below(x, -1.5))?;
    states.add_interface_for("B", "B_0", CvRange::new(x, -0.5, 0.5))?;
    states.add_interface_for("C", "C_0", CvRange::above(x, 1.5))?;

    let mut sim = DirectSimulation::new(source, states, initial, SimulationConfig::default())?;
    let checkpoint_path = std::env::args().nth(2);

    for chunk in 0..n_chunks {
        let outcome = sim.run(frames_per_chunk)?;
        println!(
            "  Chunk {}: frames = {:7}, transitions = {:4}",
            chunk + 1,
            sim.steps_observed(),
            sim.n_transitions().total
        );
        if let Some(path) = &checkpoint_path {
            std::fs::write(path, sim.checkpoint().to_json()?)?;
        }
        if !outcome.is_complete() {
            break;
        }
    }

    println!("\n══════════════════════════════════════════════════════════════");
    println!("  Rate Matrix (per time unit)");
    println!("══════════════════════════════════════════════════════════════\n");

    let frame_time = dt * stride as f64;
    let rates = sim.rate_matrix();
    print!("        ");
    for to in rates.states() {
        print!("{:>12}", to);
    }
    println!();
    for from in rates.states() {
        print!("  {:>4}  ", from);
        for to in rates.states() {
            match rates.get(from, to) {
                Some(k) => print!("{:>12.3e}", k / frame_time),
                None => print!("{:>12}", "-"),
            }
        }
        println!();
    }

    let counts = sim.n_transitions();
    println!("\nTransitions:");
    for ((from, to), n) in &counts.by_pair {
        println!("  {} → {}: {}", from, to, n);
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
