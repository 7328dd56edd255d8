//! Algorithm families and the common engine interface.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use super::result::OptimizationResult;
use crate::error::{OptimizeError, OptimizeResult};
use crate::ga::GaRunner;
use crate::hybrid::HybridRunner;
use crate::models::{OptimizationConfig, RosterProblem};
use crate::sa::SaRunner;

/// Search algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmType {
    Genetic,
    SimulatedAnnealing,
    Hybrid,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 3] = [
        AlgorithmType::Genetic,
        AlgorithmType::SimulatedAnnealing,
        AlgorithmType::Hybrid,
    ];

    /// Canonical upper-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmType::Genetic => "GENETIC",
            AlgorithmType::SimulatedAnnealing => "SIMULATED_ANNEALING",
            AlgorithmType::Hybrid => "HYBRID",
        }
    }

    /// The engine implementing this family.
    pub fn optimizer(self) -> Box<dyn ScheduleOptimizer> {
        match self {
            AlgorithmType::Genetic => Box::new(GeneticOptimizer),
            AlgorithmType::SimulatedAnnealing => Box::new(AnnealingOptimizer),
            AlgorithmType::Hybrid => Box::new(HybridOptimizer),
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmType {
    type Err = OptimizeError;

    /// Case-insensitive; accepts the canonical names plus `GA` and `SA`.
    ///
    /// ```
    /// use u_roster::optimizer::AlgorithmType;
    ///
    /// assert_eq!("ga".parse::<AlgorithmType>().unwrap(), AlgorithmType::Genetic);
    /// assert_eq!("Hybrid".parse::<AlgorithmType>().unwrap(), AlgorithmType::Hybrid);
    /// assert!("TABU".parse::<AlgorithmType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GA" | "GENETIC" => Ok(AlgorithmType::Genetic),
            "SA" | "SIMULATED_ANNEALING" => Ok(AlgorithmType::SimulatedAnnealing),
            "HYBRID" => Ok(AlgorithmType::Hybrid),
            _ => Err(OptimizeError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// One search engine behind a uniform entry point.
///
/// `config` is validated before any search starts. Infeasible outcomes,
/// cancellation and timeouts are reported in the result, not as errors.
pub trait ScheduleOptimizer: Send + Sync {
    fn algorithm(&self) -> AlgorithmType;

    fn run(
        &self,
        config: &OptimizationConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<OptimizationResult>;
}

/// [`GaRunner`] behind [`ScheduleOptimizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneticOptimizer;

impl ScheduleOptimizer for GeneticOptimizer {
    fn algorithm(&self) -> AlgorithmType {
        AlgorithmType::Genetic
    }

    fn run(
        &self,
        config: &OptimizationConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<OptimizationResult> {
        let problem = RosterProblem::new(config)?;
        let start = Instant::now();
        let result = GaRunner::run_with_cancel(&problem, &config.ga, seed, cancel)?;
        OptimizationResult::new(
            &problem,
            self.algorithm(),
            seed,
            result.best,
            result.generations,
            start.elapsed(),
            result.termination,
            result.fitness_history,
        )
    }
}

/// [`SaRunner`] behind [`ScheduleOptimizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnealingOptimizer;

impl ScheduleOptimizer for AnnealingOptimizer {
    fn algorithm(&self) -> AlgorithmType {
        AlgorithmType::SimulatedAnnealing
    }

    fn run(
        &self,
        config: &OptimizationConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<OptimizationResult> {
        let problem = RosterProblem::new(config)?;
        let start = Instant::now();
        let result = SaRunner::run_with_cancel(&problem, &config.sa, seed, cancel)?;
        OptimizationResult::new(
            &problem,
            self.algorithm(),
            seed,
            result.best,
            result.iterations,
            start.elapsed(),
            result.termination,
            result.fitness_history,
        )
    }
}

/// [`HybridRunner`] behind [`ScheduleOptimizer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridOptimizer;

impl ScheduleOptimizer for HybridOptimizer {
    fn algorithm(&self) -> AlgorithmType {
        AlgorithmType::Hybrid
    }

    fn run(
        &self,
        config: &OptimizationConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<OptimizationResult> {
        let problem = RosterProblem::new(config)?;
        let start = Instant::now();
        let result = HybridRunner::run_with_cancel(
            &problem,
            &config.ga,
            &config.sa,
            &config.hybrid,
            seed,
            cancel,
        )?;
        let iterations = result.iterations();
        OptimizationResult::new(
            &problem,
            self.algorithm(),
            seed,
            result.best,
            iterations,
            start.elapsed(),
            result.termination,
            result.fitness_history,
        )
    }
}
