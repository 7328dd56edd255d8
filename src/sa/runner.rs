//! SA execution loop.

use std::cmp::Ordering;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use super::config::{CoolingSchedule, SaConfig};
use crate::chromosome::Chromosome;
use crate::error::{ConfigError, OptimizeResult};
use crate::fitness::{FitnessEvaluator, ScoredChromosome};
use crate::models::RosterProblem;
use crate::random::{create_rng, RosterRng};
use crate::run::{RunControl, TerminationReason};

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult {
    /// The best chromosome seen along the trajectory.
    pub best: ScoredChromosome,

    /// Fitness of the starting chromosome.
    pub initial_fitness: f64,

    /// Total number of iterations (neighbor evaluations).
    pub iterations: usize,

    /// Number of temperature steps completed.
    pub temperature_steps: usize,

    /// Final temperature when the algorithm stopped.
    pub final_temperature: f64,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of strictly improving moves.
    pub improving_moves: usize,

    /// Why the loop stopped.
    pub termination: TerminationReason,

    /// Best fitness at the start and after each temperature step.
    pub fitness_history: Vec<f64>,
}

impl SaResult {
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness()
    }

    /// `true` when the best schedule stopped improving for `stagnation_limit` steps.
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::Converged
    }
}

/// Executes the Simulated Annealing algorithm.
pub struct SaRunner;

impl SaRunner {
    /// Runs SA from a greedy starting roster.
    pub fn run(problem: &RosterProblem, config: &SaConfig, seed: u64) -> OptimizeResult<SaResult> {
        Self::run_with_cancel(problem, config, seed, None)
    }

    /// Runs SA from a greedy starting roster with an optional cancellation token.
    pub fn run_with_cancel(
        problem: &RosterProblem,
        config: &SaConfig,
        seed: u64,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<SaResult> {
        let mut rng = create_rng(seed);
        let initial = Chromosome::greedy(problem, &mut rng);
        Self::anneal(problem, config, initial, rng, cancel)
    }

    /// Runs SA starting from `initial`.
    ///
    /// Fails if `initial` was built for different dimensions.
    pub fn run_from(
        problem: &RosterProblem,
        config: &SaConfig,
        seed: u64,
        initial: Chromosome,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<SaResult> {
        initial.check_dimensions(problem)?;
        Self::anneal(problem, config, initial, create_rng(seed), cancel)
    }

    fn anneal(
        problem: &RosterProblem,
        config: &SaConfig,
        initial: Chromosome,
        mut rng: RosterRng,
        cancel: Option<Arc<AtomicBool>>,
    ) -> OptimizeResult<SaResult> {
        let violations = config.validate();
        if !violations.is_empty() {
            return Err(ConfigError { violations }.into());
        }

        let control = RunControl::new(cancel, config.time_limit_ms);
        let evaluator = FitnessEvaluator::new(problem);

        // Initialize
        let mut current = evaluator.score(initial);
        let initial_fitness = current.fitness();
        let mut best = current.clone();

        info!(
            employees = problem.employees(),
            days = problem.days(),
            initial_temperature = config.initial_temperature,
            initial_fitness,
            "SA started"
        );

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut stagnant_steps = 0usize;
        // Reaching the temperature floor spends the schedule's budget.
        let mut termination = TerminationReason::MaxIterations;

        // For linear cooling: compute step count
        let linear_max_steps = compute_linear_steps(config);

        let mut fitness_history = vec![best.fitness()];
        let mut step = 0usize; // temperature step counter

        while temperature > config.min_temperature {
            if let Some(reason) = control.check() {
                termination = reason;
                break;
            }

            let inner_iters = match config.cooling {
                CoolingSchedule::LundyMees { .. } => 1,
                _ => config.iterations_per_temperature,
            };

            let mut improved_best = false;
            for _ in 0..inner_iters {
                if budget_spent(config, total_iterations) {
                    break;
                }

                let mut neighbor = current.chromosome.clone();
                neighbor.perturb(problem, config.perturbation_size, &mut rng);
                let neighbor = evaluator.score(neighbor);
                let delta = neighbor.fitness() - current.fitness();

                // Metropolis acceptance criterion, maximizing
                let accept = if delta >= 0.0 {
                    if delta > 0.0 {
                        improving_moves += 1;
                    }
                    true
                } else {
                    rng.random::<f64>() < (delta / temperature).exp()
                };

                if accept {
                    current = neighbor;
                    accepted_moves += 1;

                    if current.cmp_quality(&best) == Ordering::Greater {
                        best = current.clone();
                        improved_best = true;
                    }
                }

                total_iterations += 1;
            }

            fitness_history.push(best.fitness());

            // Check hard iteration limit
            if budget_spent(config, total_iterations) {
                termination = TerminationReason::MaxIterations;
                break;
            }

            if improved_best {
                stagnant_steps = 0;
            } else {
                stagnant_steps += 1;
            }
            if config.stagnation_limit > 0 && stagnant_steps >= config.stagnation_limit {
                termination = TerminationReason::Converged;
                break;
            }

            // Cool down
            temperature = cool(temperature, config, step, linear_max_steps);
            step += 1;

            if step % 20 == 0 {
                debug!(
                    step,
                    temperature,
                    current_fitness = current.fitness(),
                    best_fitness = best.fitness(),
                    "SA progress"
                );
            }
        }

        info!(
            iterations = total_iterations,
            best_fitness = best.fitness(),
            accepted_moves,
            termination = %termination,
            "SA finished"
        );
        if termination.is_interrupted() {
            warn!(iterations = total_iterations, termination = %termination, "SA stopped early");
        }
        if !best.evaluation.is_feasible() {
            warn!(
                hard_violations = best.evaluation.hard_violations,
                "SA returned an infeasible schedule"
            );
        }

        Ok(SaResult {
            best,
            initial_fitness,
            iterations: total_iterations,
            temperature_steps: step,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            termination,
            fitness_history,
        })
    }
}

fn budget_spent(config: &SaConfig, iterations: usize) -> bool {
    config.max_iterations > 0 && iterations >= config.max_iterations
}

/// Apply the cooling schedule to compute the next temperature.
fn cool(temperature: f64, config: &SaConfig, step: usize, linear_max_steps: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear => {
            if linear_max_steps == 0 {
                config.min_temperature
            } else {
                let t = config.initial_temperature
                    - (step + 1) as f64 * (config.initial_temperature - config.min_temperature)
                        / linear_max_steps as f64;
                t.max(config.min_temperature)
            }
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}

/// Estimate the number of temperature steps for linear cooling.
fn compute_linear_steps(config: &SaConfig) -> usize {
    match config.cooling {
        CoolingSchedule::Linear => {
            if config.max_iterations > 0 && config.iterations_per_temperature > 0 {
                config.max_iterations / config.iterations_per_temperature
            } else {
                1000 // reasonable default
            }
        }
        _ => 0,
    }
}
