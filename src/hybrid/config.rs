//! Hybrid engine configuration.

use crate::error::ConfigViolation;

/// Configuration for the hybrid engine.
///
/// Population and operator settings come from the GA configuration and the
/// cooling schedule from the SA configuration; this struct only holds the
/// budgets of each phase.
///
/// # Examples
///
/// ```
/// use u_roster::hybrid::HybridConfig;
///
/// let config = HybridConfig::default()
///     .with_ga_generations(60)
///     .with_refine_top_k(4)
///     .with_sa_iterations(2_000);
/// assert_eq!(config.iterations_per_refinement(), 500);
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HybridConfig {
    /// Generations of the GA phase. Replaces `GaConfig::max_generations`.
    pub ga_generations: usize,

    /// Number of distinct elites refined by SA.
    pub refine_top_k: usize,

    /// Total SA iteration budget, split evenly across the refined elites.
    pub sa_iterations: usize,

    /// Starting temperature of each refinement.
    ///
    /// Lower than a from-scratch SA run so refinement stays near the elite.
    pub refine_temperature: f64,

    /// Refine elites concurrently.
    pub parallel: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            ga_generations: 100,
            refine_top_k: 3,
            sa_iterations: 3_000,
            refine_temperature: 0.1,
            parallel: true,
        }
    }
}

impl HybridConfig {
    pub fn with_ga_generations(mut self, n: usize) -> Self {
        self.ga_generations = n;
        self
    }

    pub fn with_refine_top_k(mut self, k: usize) -> Self {
        self.refine_top_k = k;
        self
    }

    pub fn with_sa_iterations(mut self, n: usize) -> Self {
        self.sa_iterations = n;
        self
    }

    pub fn with_refine_temperature(mut self, t: f64) -> Self {
        self.refine_temperature = t;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// SA iterations granted to each refined elite (at least 1).
    pub fn iterations_per_refinement(&self) -> usize {
        (self.sa_iterations / self.refine_top_k.max(1)).max(1)
    }

    /// Checks every parameter; field paths are prefixed with `hybrid.`.
    pub fn validate(&self) -> Vec<ConfigViolation> {
        let mut v = Vec::new();
        if self.ga_generations == 0 {
            v.push(ConfigViolation::new(
                "hybrid.ga_generations",
                "must be at least 1",
            ));
        }
        if self.refine_top_k == 0 {
            v.push(ConfigViolation::new(
                "hybrid.refine_top_k",
                "must be at least 1",
            ));
        }
        if self.sa_iterations == 0 {
            v.push(ConfigViolation::new(
                "hybrid.sa_iterations",
                "must be at least 1",
            ));
        }
        if !(self.refine_temperature.is_finite() && self.refine_temperature > 0.0) {
            v.push(ConfigViolation::new(
                "hybrid.refine_temperature",
                "must be positive",
            ));
        }
        v
    }
}
