//! Genetic Algorithm engine.
//!
//! Population search over rosters: a partly greedy-seeded population is
//! evaluated in parallel, parents are selected, recombined by whole rows,
//! columns or genes, mutated gene by gene, and the top elites are carried
//! unchanged into the next generation.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, selection, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Final population and run statistics
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod runner;
mod selection;

pub use config::GaConfig;
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
