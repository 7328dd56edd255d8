//! Engine selection and dispatch.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use super::algorithm::{AlgorithmType, ScheduleOptimizer};
use super::result::OptimizationResult;
use crate::chromosome::Chromosome;
use crate::error::{OptimizeError, OptimizeResult};
use crate::models::OptimizationConfig;
use crate::random::resolve_seed;

/// Outcome of [`OptimizationFactory::validate_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigValidation {
    pub valid: bool,
    /// `"ok"` or the full list of violations.
    pub message: String,
    /// Employees × days.
    pub problem_size: usize,
    pub algorithm_recommendation: String,
}

/// Chooses and runs an engine for a configuration.
///
/// Auto-selection goes by problem size (employees × days): below
/// `sa_threshold` simulated annealing, below `hybrid_threshold` the genetic
/// algorithm, otherwise the hybrid engine.
///
/// # Examples
///
/// ```
/// use u_roster::optimizer::{AlgorithmType, OptimizationFactory};
///
/// let factory = OptimizationFactory::default();
/// assert_eq!(factory.recommend_for_size(35), AlgorithmType::SimulatedAnnealing);
/// assert_eq!(factory.recommend_for_size(600), AlgorithmType::Genetic);
/// assert_eq!(factory.recommend_for_size(3_000), AlgorithmType::Hybrid);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationFactory {
    /// Sizes below this run SA.
    pub sa_threshold: usize,
    /// Sizes at or above this run the hybrid engine.
    pub hybrid_threshold: usize,
}

impl Default for OptimizationFactory {
    fn default() -> Self {
        Self {
            sa_threshold: 150,
            hybrid_threshold: 1500,
        }
    }
}

impl OptimizationFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(mut self, sa_threshold: usize, hybrid_threshold: usize) -> Self {
        self.sa_threshold = sa_threshold;
        self.hybrid_threshold = hybrid_threshold;
        self
    }

    /// The engine for `algorithm`.
    pub fn create(&self, algorithm: AlgorithmType) -> Box<dyn ScheduleOptimizer> {
        algorithm.optimizer()
    }

    pub fn recommend_for_size(&self, problem_size: usize) -> AlgorithmType {
        if problem_size < self.sa_threshold {
            AlgorithmType::SimulatedAnnealing
        } else if problem_size < self.hybrid_threshold {
            AlgorithmType::Genetic
        } else {
            AlgorithmType::Hybrid
        }
    }

    /// The algorithm auto-selection would run for `config`.
    pub fn recommend(&self, config: &OptimizationConfig) -> AlgorithmType {
        self.recommend_for_size(config.problem_size())
    }

    /// Human-readable form of [`recommend`](Self::recommend).
    pub fn algorithm_recommendation(&self, config: &OptimizationConfig) -> String {
        let size = config.problem_size();
        let algorithm = self.recommend_for_size(size);
        let reason = match algorithm {
            AlgorithmType::SimulatedAnnealing => format!("below {}", self.sa_threshold),
            AlgorithmType::Genetic => format!(
                "between {} and {}",
                self.sa_threshold, self.hybrid_threshold
            ),
            AlgorithmType::Hybrid => format!("at or above {}", self.hybrid_threshold),
        };
        format!(
            "{algorithm}: problem size {size} ({} employees x {} days) is {reason}",
            config.employee_count(),
            config.period_days
        )
    }

    /// Validates `config` without running anything.
    pub fn validate_config(&self, config: &OptimizationConfig) -> ConfigValidation {
        let (valid, message) = match config.validate() {
            Ok(()) => (true, "ok".to_string()),
            Err(e) => (false, e.to_string()),
        };
        ConfigValidation {
            valid,
            message,
            problem_size: config.problem_size(),
            algorithm_recommendation: self.algorithm_recommendation(config),
        }
    }

    /// Runs the auto-selected algorithm.
    pub fn optimize(&self, config: &OptimizationConfig) -> OptimizeResult<OptimizationResult> {
        self.optimize_with_cancel(config, None, None)
    }

    /// Runs `algorithm`.
    pub fn optimize_with(
        &self,
        config: &OptimizationConfig,
        algorithm: AlgorithmType,
    ) -> OptimizeResult<OptimizationResult> {
        self.optimize_with_cancel(config, Some(algorithm), None)
    }

    /// Runs the algorithm named `name`; `"AUTO"` selects by problem size.
    ///
    /// Unknown names fail with [`OptimizeError::UnsupportedAlgorithm`].
    pub fn optimize_named(
        &self,
        config: &OptimizationConfig,
        name: &str,
    ) -> OptimizeResult<OptimizationResult> {
        let algorithm = if name.trim().eq_ignore_ascii_case("AUTO") {
            None
        } else {
            Some(name.parse::<AlgorithmType>()?)
        };
        self.optimize_with_cancel(config, algorithm, None)
    }

    /// Runs `algorithm` (auto-selected if `None`) with an optional
    /// cancellation token.
    ///
    /// A cancelled run still returns its best schedule so far.
    pub fn optimize_with_cancel(
        &self,
        config: &OptimizationConfig,
        algorithm: Option<AlgorithmType>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<OptimizationResult> {
        config.validate()?;
        let algorithm = algorithm.unwrap_or_else(|| self.recommend(config));
        let seed = resolve_seed(config.seed);
        info!(
            algorithm = %algorithm,
            problem_size = config.problem_size(),
            seed,
            "optimization dispatched"
        );
        let result = self.create(algorithm).run(config, seed, cancel)?;
        info!(
            algorithm = %algorithm,
            best_fitness = result.best_fitness,
            quality = %result.quality,
            iterations = result.iterations,
            duration_ms = result.duration.as_millis() as u64,
            "optimization finished"
        );
        Ok(result)
    }

    /// Runs every algorithm concurrently on the same config and seed.
    pub fn compare_algorithms(
        &self,
        config: &OptimizationConfig,
    ) -> OptimizeResult<BTreeMap<AlgorithmType, OptimizationResult>> {
        config.validate()?;
        let seed = resolve_seed(config.seed);
        info!(seed, "comparing algorithms");
        AlgorithmType::ALL
            .par_iter()
            .map(|&algorithm| {
                self.create(algorithm)
                    .run(config, seed, None)
                    .map(|result| (algorithm, result))
            })
            .collect()
    }

    /// Repairs the conflicts of an existing schedule.
    ///
    /// Not supported: always fails with
    /// [`OptimizeError::UnsupportedOperation`]. Re-run an optimization
    /// instead.
    pub fn resolve_conflicts(
        &self,
        _config: &OptimizationConfig,
        _chromosome: &Chromosome,
    ) -> OptimizeResult<Chromosome> {
        Err(OptimizeError::UnsupportedOperation {
            operation: "resolve_conflicts".to_string(),
        })
    }
}
