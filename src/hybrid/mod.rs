//! Hybrid GA + SA engine.
//!
//! Runs the genetic algorithm for a fixed number of generations, then
//! refines the best distinct individuals of the final population with
//! independent simulated-annealing trajectories. The phase order is fixed:
//! population search first, local repair second.
//!
//! # Key Types
//!
//! - [`HybridConfig`]: phase budgets and refinement width
//! - [`HybridRunner`]: Executes both phases
//! - [`HybridResult`]: Best roster and per-phase statistics

mod config;
mod runner;

pub use config::HybridConfig;
pub use runner::{HybridResult, HybridRunner};
