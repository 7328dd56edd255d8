//! Hybrid execution: GA phase, then SA refinement of elites.

use std::cmp::Ordering;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::HybridConfig;
use crate::chromosome::Chromosome;
use crate::error::{ConfigError, OptimizeResult};
use crate::fitness::ScoredChromosome;
use crate::ga::{GaConfig, GaRunner};
use crate::models::RosterProblem;
use crate::random::derive_seed;
use crate::run::TerminationReason;
use crate::sa::{SaConfig, SaResult, SaRunner};

/// Result of a hybrid run.
#[derive(Debug, Clone)]
pub struct HybridResult {
    /// Best chromosome across both phases.
    pub best: ScoredChromosome,

    /// Best fitness at the end of the GA phase.
    pub ga_best_fitness: f64,

    /// Generations executed by the GA phase.
    pub generations: usize,

    /// SA iterations summed over all refinements.
    pub sa_iterations: usize,

    /// Number of elites that were refined.
    pub refined: usize,

    /// Why the run stopped.
    pub termination: TerminationReason,

    /// GA best-fitness history followed by the best fitness after refinement.
    pub fitness_history: Vec<f64>,
}

impl HybridResult {
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness()
    }

    /// Total iterations across both phases.
    pub fn iterations(&self) -> usize {
        self.generations + self.sa_iterations
    }

    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }
}

/// Executes the hybrid GA + SA search.
pub struct HybridRunner;

impl HybridRunner {
    /// Runs the hybrid search.
    ///
    /// `ga` supplies population and operator settings, `sa` the cooling
    /// schedule used during refinement.
    pub fn run(
        problem: &RosterProblem,
        ga: &GaConfig,
        sa: &SaConfig,
        hybrid: &HybridConfig,
        seed: u64,
    ) -> OptimizeResult<HybridResult> {
        Self::run_with_cancel(problem, ga, sa, hybrid, seed, None)
    }

    /// Runs the hybrid search with an optional cancellation token shared by
    /// both phases.
    pub fn run_with_cancel(
        problem: &RosterProblem,
        ga: &GaConfig,
        sa: &SaConfig,
        hybrid: &HybridConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<HybridResult> {
        let ga_config = ga.clone().with_max_generations(hybrid.ga_generations);
        let sa_config = refinement_config(sa, hybrid);

        let mut violations = hybrid.validate();
        violations.extend(ga_config.validate());
        violations.extend(sa_config.validate());
        if !violations.is_empty() {
            return Err(ConfigError { violations }.into());
        }

        info!(
            employees = problem.employees(),
            days = problem.days(),
            ga_generations = hybrid.ga_generations,
            refine_top_k = hybrid.refine_top_k,
            seed,
            "hybrid started"
        );

        // Phase 1: global exploration
        let ga_result = GaRunner::run_with_cancel(problem, &ga_config, seed, cancel.clone())?;
        let ga_best_fitness = ga_result.best_fitness();
        let mut fitness_history = ga_result.fitness_history;
        let mut best = ga_result.best;

        if ga_result.termination.is_interrupted() {
            warn!(
                generations = ga_result.generations,
                termination = %ga_result.termination,
                "hybrid interrupted during GA phase, skipping refinement"
            );
            return Ok(HybridResult {
                best,
                ga_best_fitness,
                generations: ga_result.generations,
                sa_iterations: 0,
                refined: 0,
                termination: ga_result.termination,
                fitness_history,
            });
        }

        // Phase 2: local refinement of distinct elites
        let elites = distinct_elites(&ga_result.population, hybrid.refine_top_k);
        debug!(
            elites = elites.len(),
            iterations_each = sa_config.max_iterations,
            "hybrid refinement started"
        );

        let refine = |(i, elite): (usize, Chromosome)| {
            SaRunner::run_from(
                problem,
                &sa_config,
                derive_seed(seed, i as u64 + 1),
                elite,
                cancel.clone(),
            )
        };
        let indexed: Vec<(usize, Chromosome)> = elites.into_iter().enumerate().collect();
        let refinements: Vec<SaResult> = if hybrid.parallel {
            indexed
                .into_par_iter()
                .map(refine)
                .collect::<OptimizeResult<_>>()?
        } else {
            indexed
                .into_iter()
                .map(refine)
                .collect::<OptimizeResult<_>>()?
        };

        let mut sa_iterations = 0;
        let mut interrupted = None;
        for refinement in &refinements {
            sa_iterations += refinement.iterations;
            if refinement.termination.is_interrupted() {
                interrupted.get_or_insert(refinement.termination);
            }
            if refinement.best.cmp_quality(&best) == Ordering::Greater {
                best = refinement.best.clone();
            }
        }
        fitness_history.push(best.fitness());

        let termination = match interrupted {
            Some(reason) => reason,
            None if ga_result.termination == TerminationReason::Converged
                && refinements.iter().all(SaResult::converged) =>
            {
                TerminationReason::Converged
            }
            None => TerminationReason::MaxIterations,
        };

        info!(
            generations = ga_result.generations,
            sa_iterations,
            ga_best_fitness,
            best_fitness = best.fitness(),
            termination = %termination,
            "hybrid finished"
        );
        if !best.evaluation.is_feasible() {
            warn!(
                hard_violations = best.evaluation.hard_violations,
                "hybrid returned an infeasible schedule"
            );
        }

        Ok(HybridResult {
            best,
            ga_best_fitness,
            generations: ga_result.generations,
            sa_iterations,
            refined: refinements.len(),
            termination,
            fitness_history,
        })
    }
}

/// SA settings for a single elite refinement.
fn refinement_config(sa: &SaConfig, hybrid: &HybridConfig) -> SaConfig {
    let t0 = hybrid.refine_temperature;
    sa.clone()
        .with_initial_temperature(t0)
        .with_min_temperature(sa.min_temperature.min(t0 * 1e-3))
        .with_max_iterations(hybrid.iterations_per_refinement())
}

/// The first `k` pairwise-distinct chromosomes of a best-first population.
fn distinct_elites(population: &[ScoredChromosome], k: usize) -> Vec<Chromosome> {
    let mut elites: Vec<Chromosome> = Vec::with_capacity(k);
    for scored in population {
        if elites.len() == k {
            break;
        }
        if !elites.contains(&scored.chromosome) {
            elites.push(scored.chromosome.clone());
        }
    }
    elites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, LaborConstraints, OptimizationConfig, Shift};
    use chrono::NaiveTime;

    fn problem(employees: usize, days: usize, headcount: u32) -> RosterProblem {
        let config = OptimizationConfig::default()
            .with_period_days(days)
            .with_shifts(vec![
                Shift::new(
                    "am",
                    "Morning",
                    NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                    headcount,
                ),
                Shift::new(
                    "pm",
                    "Evening",
                    NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
                    headcount,
                ),
            ])
            .with_employees((0..employees).map(|i| Employee::new(format!("e{i}"))).collect())
            .with_constraints(
                LaborConstraints::default()
                    .with_max_consecutive_work_days(5)
                    .with_min_rest_days_per_week(2),
            );
        RosterProblem::new(&config).unwrap()
    }

    fn ga() -> GaConfig {
        GaConfig::fast().with_population_size(20).with_parallel(false)
    }

    fn hybrid() -> HybridConfig {
        HybridConfig::default()
            .with_ga_generations(20)
            .with_refine_top_k(3)
            .with_sa_iterations(600)
    }

    #[test]
    fn test_refinement_never_loses_ga_best() {
        let p = problem(8, 14, 2);
        let result = HybridRunner::run(&p, &ga(), &SaConfig::default(), &hybrid(), 42).unwrap();
        assert!(result.best_fitness() >= result.ga_best_fitness);
        assert_eq!(result.generations, 20);
        assert_eq!(result.refined, 3);
        assert!(result.sa_iterations <= 600);
        assert_eq!(result.fitness_history.len(), 22);
    }

    #[test]
    fn test_parallel_and_sequential_refinement_agree() {
        let p = problem(6, 14, 1);
        let a = HybridRunner::run(&p, &ga(), &SaConfig::default(), &hybrid(), 5).unwrap();
        let b = HybridRunner::run(
            &p,
            &ga(),
            &SaConfig::default(),
            &hybrid().with_parallel(false),
            5,
        )
        .unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.sa_iterations, b.sa_iterations);
    }

    #[test]
    fn test_cancelled_before_start_skips_refinement() {
        let p = problem(6, 7, 1);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = HybridRunner::run_with_cancel(
            &p,
            &ga(),
            &SaConfig::default(),
            &hybrid(),
            1,
            Some(cancel),
        )
        .unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert_eq!(result.refined, 0);
        assert_eq!(result.sa_iterations, 0);
    }

    #[test]
    fn test_converged_needs_both_phases() {
        let p = problem(6, 7, 1);
        let ga = ga().with_stagnation_limit(5);
        let hybrid = hybrid().with_ga_generations(500);

        // Refinements stop on their iteration budget.
        let budgeted = HybridRunner::run(&p, &ga, &SaConfig::default(), &hybrid, 8).unwrap();
        assert!(budgeted.generations < 500);
        assert_eq!(budgeted.termination, TerminationReason::MaxIterations);
        assert!(!budgeted.converged());

        let stalling = SaConfig::default()
            .with_iterations_per_temperature(10)
            .with_stagnation_limit(1);
        let both = HybridRunner::run(&p, &ga, &stalling, &hybrid, 8).unwrap();
        assert_eq!(both.termination, TerminationReason::Converged);
    }

    #[test]
    fn test_time_limit_in_ga_phase() {
        let p = problem(40, 28, 3);
        let ga = ga().with_stagnation_limit(0).with_time_limit_ms(1);
        let hybrid = hybrid().with_ga_generations(1_000_000);
        let result = HybridRunner::run(&p, &ga, &SaConfig::default(), &hybrid, 4).unwrap();
        assert_eq!(result.termination, TerminationReason::TimedOut);
        assert!(!result.converged());
        assert_eq!(result.refined, 0);
        assert!(result.best_fitness() >= result.fitness_history[0]);
    }

    #[test]
    fn test_invalid_sub_configs_are_all_reported() {
        let p = problem(4, 7, 1);
        let err = HybridRunner::run(
            &p,
            &ga().with_population_size(0),
            &SaConfig::default().with_perturbation_size(0),
            &hybrid().with_refine_top_k(0),
            1,
        )
        .unwrap_err();
        match err {
            crate::error::OptimizeError::Config(e) => {
                assert!(e.has_field("hybrid.refine_top_k"));
                assert!(e.has_field("ga.population_size"));
                assert!(e.has_field("sa.perturbation_size"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_refinement_temperature_below_sa_floor() {
        let sa = SaConfig::default().with_min_temperature(0.5);
        let config = refinement_config(&sa, &HybridConfig::default());
        assert!(config.min_temperature < config.initial_temperature);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_distinct_elites_skips_duplicates() {
        let p = problem(3, 7, 1);
        let evaluator = crate::fitness::FitnessEvaluator::new(&p);
        let a = evaluator.score(Chromosome::empty_for(&p));
        let mut other = Chromosome::empty_for(&p);
        other.assign(0, 0, 0);
        let b = evaluator.score(other);
        let population = vec![a.clone(), a.clone(), b.clone(), a];
        let elites = distinct_elites(&population, 3);
        assert_eq!(elites.len(), 2);
        assert_eq!(elites[1], b.chromosome);
    }
}
