//! Selection strategies for the GA.
//!
//! Selection determines which chromosomes are chosen as parents for
//! crossover. Different strategies provide different selection pressure.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use std::cmp::Ordering;

use rand::Rng;

use crate::fitness::ScoredChromosome;

/// Selection strategy for choosing parents.
///
/// All strategies assume **maximization** and rank ties by
/// [`Evaluation::cmp_quality`](crate::fitness::Evaluation::cmp_quality):
/// fewer hard violations first, then higher raw score.
///
/// # Examples
///
/// ```
/// use u_roster::ga::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::Tournament(3);
///
/// // Roulette wheel (fitness-proportionate)
/// let sel = Selection::Roulette;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Tournament selection: pick `k` chromosomes at random, select the best.
    ///
    /// Higher `k` = stronger selection pressure.
    /// - k=2: light pressure (good for diversity)
    /// - k=3-5: moderate pressure (typical default)
    /// - k>5: strong pressure (risk of premature convergence)
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Fitness is shifted by the population minimum so that penalized
    /// (negative) fitness values still yield positive weights.
    Roulette,

    /// Linear rank-based selection.
    ///
    /// Selection probability is proportional to rank position, not raw
    /// fitness value, which avoids the scaling problems of roulette wheel
    /// selection when hard penalties dominate the fitness range.
    ///
    /// Reference: Baker (1985), "Adaptive Selection Methods for Genetic
    /// Algorithms"
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index from the population.
    ///
    /// Returns 0 for an empty population; the runner never selects from one.
    pub fn select<R: Rng>(&self, population: &[ScoredChromosome], rng: &mut R) -> usize {
        if population.len() <= 1 {
            return 0;
        }
        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

/// Tournament selection: pick k random chromosomes, return the best.
fn tournament<R: Rng>(population: &[ScoredChromosome], k: usize, rng: &mut R) -> usize {
    let n = population.len();
    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if population[idx].cmp_quality(&population[best_idx]) == Ordering::Greater {
            best_idx = idx;
        }
    }
    best_idx
}

/// Roulette wheel selection over min-shifted fitness.
///
/// weight_i = fitness_i - min_fitness + epsilon
fn roulette<R: Rng>(population: &[ScoredChromosome], rng: &mut R) -> usize {
    let n = population.len();
    let min_fitness = population
        .iter()
        .map(ScoredChromosome::fitness)
        .fold(f64::INFINITY, f64::min);

    let epsilon = 1e-10;
    let weights: Vec<f64> = population
        .iter()
        .map(|c| (c.fitness() - min_fitness).max(0.0) + epsilon)
        .collect();

    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

/// Rank-based selection using linear ranking.
///
/// Chromosomes are sorted best first; rank 0 gets weight n, the worst gets 1.
fn rank<R: Rng>(population: &[ScoredChromosome], rng: &mut R) -> usize {
    let n = population.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| population[b].cmp_quality(&population[a]));

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (rank, &idx) in order.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return idx;
        }
    }

    order[n - 1] // floating-point fallback
}
