//! Simulation Module: Direct Simulation Driver
//!
//! Owns the step loop of a single long trajectory:
//!
//! ```text
//!   TrajectorySource ──next()──▶ DirectSimulation ──observe()──▶ FluxTracker
//!                                      │                            │
//!                              CancelToken / wall-clock        AccountingTables
//!                                      │                            │
//!                                  RunOutcome                  RateEstimator
//! ```
//!
//! Steps are strictly sequential. Independent replicas need independent
//! drivers; their tables are combined with
//! [`RateEstimator::from_replicas`](crate::rates::RateEstimator::from_replicas).

mod cache;
mod cancel;
mod checkpoint;
mod config;
mod driver;
mod source;

pub use cache::ClassificationCache;
pub use cancel::CancelToken;
pub use checkpoint::Checkpoint;
pub use config::SimulationConfig;
pub use driver::{DirectSimulation, RunOutcome, StopReason};
pub use source::{FnSource, ReplaySource, SystemSource, TrajectorySource};
