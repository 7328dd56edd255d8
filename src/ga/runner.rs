//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization → evaluation → selection → crossover → mutation →
//! elitism → repeat.

use std::cmp::Ordering;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::GaConfig;
use crate::chromosome::Chromosome;
use crate::error::{ConfigError, OptimizeResult};
use crate::fitness::{FitnessEvaluator, ScoredChromosome};
use crate::models::RosterProblem;
use crate::random::create_rng;
use crate::run::{RunControl, TerminationReason};

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best chromosome found during the entire run.
    pub best: ScoredChromosome,

    /// Total number of generations executed.
    pub generations: usize,

    /// Why the loop stopped.
    pub termination: TerminationReason,

    /// Best fitness after initialization and after each generation.
    pub fitness_history: Vec<f64>,

    /// Final population, best first.
    pub population: Vec<ScoredChromosome>,
}

impl GaResult {
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness()
    }

    /// `true` when the run stopped on stagnation.
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let problem = RosterProblem::new(&config)?;
/// let result = GaRunner::run(&problem, &GaConfig::for_roster(5, 7), 42)?;
/// println!("Best fitness: {}", result.best_fitness());
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA optimization.
    pub fn run(problem: &RosterProblem, config: &GaConfig, seed: u64) -> OptimizeResult<GaResult> {
        Self::run_with_cancel(problem, config, seed, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is `Some` and the flag is set to `true`, the GA will
    /// stop at the next generation boundary and return the best
    /// chromosome found so far.
    pub fn run_with_cancel(
        problem: &RosterProblem,
        config: &GaConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<GaResult> {
        let violations = config.validate();
        if !violations.is_empty() {
            return Err(ConfigError { violations }.into());
        }

        let control = RunControl::new(cancel, config.time_limit_ms);
        let evaluator = FitnessEvaluator::new(problem);
        let mut rng = create_rng(seed);

        info!(
            employees = problem.employees(),
            days = problem.days(),
            population = config.population_size,
            max_generations = config.max_generations,
            seed,
            "GA started"
        );

        // 1. Initialize population
        let seeded = ((config.population_size as f64 * config.seeded_ratio).round() as usize)
            .min(config.population_size);
        let initial: Vec<Chromosome> = (0..config.population_size)
            .map(|i| {
                if i < seeded {
                    Chromosome::greedy(problem, &mut rng)
                } else {
                    Chromosome::random(problem, &mut rng)
                }
            })
            .collect();

        // 2. Evaluate initial population
        let mut population = evaluate_population(&evaluator, initial, config.parallel);
        sort_best_first(&mut population);

        // 3. Track best
        let mut best = population[0].clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness());

        let elite_count = config.elite_count;
        let mut stagnation_counter = 0usize;
        let mut generations = 0usize;
        let mut termination = TerminationReason::MaxIterations;

        // 4. Evolutionary loop
        for gen in 0..config.max_generations {
            if let Some(reason) = control.check() {
                termination = reason;
                break;
            }

            // Generate offspring; elites are already evaluated
            let needed = config.population_size - elite_count;
            let mut offspring: Vec<Chromosome> = Vec::with_capacity(needed + 1);
            while offspring.len() < needed {
                let p1 = &population[config.selection.select(&population, &mut rng)].chromosome;
                let p2 = &population[config.selection.select(&population, &mut rng)].chromosome;

                let (c1, c2) = if rng.random_bool(config.crossover_rate) {
                    p1.crossover(p2, config.crossover, &mut rng)
                } else {
                    (p1.clone(), p2.clone())
                };

                for mut child in [c1, c2] {
                    if offspring.len() >= needed {
                        break;
                    }
                    child.mutate(problem, config.mutation_rate, &mut rng);
                    offspring.push(child);
                }
            }

            let evaluated = evaluate_population(&evaluator, offspring, config.parallel);
            population.truncate(elite_count);
            population.extend(evaluated);
            sort_best_first(&mut population);

            // Update best
            let gen_best = &population[0];
            if gen_best.cmp_quality(&best) == Ordering::Greater {
                best = gen_best.clone();
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }

            fitness_history.push(best.fitness());
            generations = gen + 1;

            if generations % 25 == 0 {
                debug!(
                    generation = generations,
                    best_fitness = best.fitness(),
                    hard_violations = best.evaluation.hard_violations,
                    stagnation = stagnation_counter,
                    "GA progress"
                );
            }

            // Stagnation check
            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                termination = TerminationReason::Converged;
                break;
            }
        }

        info!(
            generations,
            best_fitness = best.fitness(),
            termination = %termination,
            "GA finished"
        );
        if termination.is_interrupted() {
            warn!(generations, termination = %termination, "GA stopped early");
        }
        if !best.evaluation.is_feasible() {
            warn!(
                hard_violations = best.evaluation.hard_violations,
                "GA returned an infeasible schedule"
            );
        }

        Ok(GaResult {
            best,
            generations,
            termination,
            fitness_history,
            population,
        })
    }
}

/// Evaluate all chromosomes, preserving order.
fn evaluate_population(
    evaluator: &FitnessEvaluator<'_>,
    chromosomes: Vec<Chromosome>,
    parallel: bool,
) -> Vec<ScoredChromosome> {
    if parallel {
        chromosomes
            .into_par_iter()
            .map(|c| evaluator.score(c))
            .collect()
    } else {
        chromosomes.into_iter().map(|c| evaluator.score(c)).collect()
    }
}

/// Stable sort, best first.
fn sort_best_first(population: &mut [ScoredChromosome]) {
    population.sort_by(|a, b| b.cmp_quality(a));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::Selection;
    use crate::models::{Employee, LaborConstraints, OptimizationConfig, Shift};
    use chrono::NaiveTime;
    use std::sync::atomic::Ordering as AtomicOrdering;

    fn problem(employees: usize, days: usize, headcount: u32) -> RosterProblem {
        let config = OptimizationConfig::default()
            .with_period_days(days)
            .with_shifts(vec![Shift::new(
                "day",
                "Day",
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                headcount,
            )])
            .with_employees((0..employees).map(|i| Employee::new(format!("e{i}"))).collect())
            .with_constraints(
                LaborConstraints::default()
                    .with_max_consecutive_work_days(5)
                    .with_min_rest_days_per_week(1),
            );
        RosterProblem::new(&config).unwrap()
    }

    fn config() -> GaConfig {
        GaConfig::default()
            .with_population_size(30)
            .with_max_generations(50)
            .with_parallel(false)
    }

    #[test]
    fn test_finds_feasible_roster() {
        let p = problem(5, 7, 2);
        let result = GaRunner::run(&p, &config(), 42).unwrap();
        assert!(result.best.evaluation.is_feasible());
        assert_eq!(result.best.evaluation.scores.efficiency, 1.0);
    }

    #[test]
    fn test_random_only_population_improves() {
        let p = problem(6, 14, 2);
        let config = config().with_seeded_ratio(0.0).with_max_generations(80);
        let result = GaRunner::run(&p, &config, 7).unwrap();
        assert!(result.fitness_history.last() > result.fitness_history.first());
    }

    #[test]
    fn test_elitism_never_regresses() {
        let p = problem(6, 14, 2);
        let config = config().with_seeded_ratio(0.0).with_stagnation_limit(0);
        let result = GaRunner::run(&p, &config, 3).unwrap();
        for window in result.fitness_history.windows(2) {
            assert!(
                window[1] >= window[0],
                "fitness regressed: {} < {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_fitness_history_length() {
        let p = problem(4, 7, 1);
        let config = config().with_max_generations(30).with_stagnation_limit(0);
        let result = GaRunner::run(&p, &config, 1).unwrap();
        assert_eq!(result.generations, 30);
        assert_eq!(result.fitness_history.len(), 31);
        assert_eq!(result.termination, TerminationReason::MaxIterations);
        assert_eq!(result.population.len(), 30);
    }

    #[test]
    fn test_stagnation_termination() {
        let p = problem(5, 7, 2);
        let config = config()
            .with_max_generations(1000)
            .with_stagnation_limit(10);
        let result = GaRunner::run(&p, &config, 42).unwrap();
        assert!(result.converged());
        assert!(result.generations < 1000);
    }

    #[test]
    fn test_pre_cancelled_run_returns_initial_best() {
        let p = problem(5, 7, 2);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = GaRunner::run_with_cancel(&p, &config(), 42, Some(cancel)).unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert_eq!(result.generations, 0);
        assert_eq!(result.fitness_history.len(), 1);
    }

    #[test]
    fn test_cancellation_from_another_thread() {
        let p = problem(10, 28, 3);
        let config = config()
            .with_max_generations(1_000_000)
            .with_stagnation_limit(0);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_clone = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            cancel_clone.store(true, AtomicOrdering::Relaxed);
        });
        let result = GaRunner::run_with_cancel(&p, &config, 42, Some(cancel)).unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_time_limit_keeps_best_so_far() {
        let p = problem(40, 28, 3);
        let config = config()
            .with_population_size(60)
            .with_max_generations(1_000_000)
            .with_stagnation_limit(0)
            .with_time_limit_ms(1);
        let result = GaRunner::run(&p, &config, 5).unwrap();
        assert_eq!(result.termination, TerminationReason::TimedOut);
        assert!(!result.converged());
        assert!(result.generations < 1_000_000);
        assert!(result.best_fitness() >= result.fitness_history[0]);
    }

    #[test]
    fn test_deterministic_and_parallel_agnostic() {
        let p = problem(6, 14, 2);
        let a = GaRunner::run(&p, &config(), 99).unwrap();
        let b = GaRunner::run(&p, &config().with_parallel(true), 99).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_all_selection_strategies() {
        let p = problem(5, 7, 2);
        for selection in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            let result = GaRunner::run(&p, &config().with_selection(selection), 42).unwrap();
            assert!(
                result.best.evaluation.is_feasible(),
                "selection {selection:?} should reach a feasible roster"
            );
        }
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let p = problem(2, 7, 1);
        assert!(GaRunner::run(&p, &GaConfig::default().with_population_size(1), 1).is_err());
    }
}
