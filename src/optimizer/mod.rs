//! Algorithm selection and the standardized result.
//!
//! [`OptimizationFactory`] validates a configuration, picks an engine
//! (explicitly or by problem size) and packages the engine's best roster
//! into an [`OptimizationResult`] with conflicts, violation counters and a
//! [`QualityLevel`].

mod algorithm;
mod factory;
mod result;

pub use algorithm::{
    AlgorithmType, AnnealingOptimizer, GeneticOptimizer, HybridOptimizer, ScheduleOptimizer,
};
pub use factory::{ConfigValidation, OptimizationFactory};
pub use result::{
    OptimizationResult, QualityLevel, ViolationCounters, ACCEPTABLE_FITNESS,
    HIGH_QUALITY_FITNESS,
};
