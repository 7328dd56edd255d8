//! Multi-objective fitness evaluation.
//!
//! Fitness is maximized. The composite score is
//!
//! ```text
//! fitness = Σ wᵢ·scoreᵢ − 0.01·Σ soft severity − hard_unit·Σ hard severity
//! ```
//!
//! where the four normalized objective scores lie in `[0, 1]` and the weights
//! sum to 1. `hard_unit` is derived from the problem dimensions so that a
//! single hard conflict costs more than the full objective range plus the
//! largest possible soft penalty: every feasible schedule outranks every
//! infeasible one.

use std::cmp::Ordering;

use crate::chromosome::Chromosome;
use crate::conflict::{ConflictDetector, ConflictTally, ScheduleConflict};
use crate::error::OptimizeResult;
use crate::models::{OptimizationConfig, RosterProblem};

/// Penalty per unit of soft-conflict severity.
pub const SOFT_PENALTY_UNIT: f64 = 0.01;

/// Normalized objective scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveScores {
    /// `1 / (1 + variance of work-days per employee)`.
    pub fairness: f64,
    /// Minimal staffing cost over actual cost, overtime included.
    pub cost: f64,
    /// Exactly staffed cells over cells that need or received staff.
    pub efficiency: f64,
    /// Mean preference weight over assignments of employees with preferences.
    pub satisfaction: f64,
}

impl ObjectiveScores {
    /// Weighted sum under `[fairness, cost, efficiency, satisfaction]` weights.
    pub fn weighted(&self, weights: [f64; 4]) -> f64 {
        weights[0] * self.fairness
            + weights[1] * self.cost
            + weights[2] * self.efficiency
            + weights[3] * self.satisfaction
    }
}

/// Complete evaluation of one chromosome.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Composite fitness; higher is better.
    pub fitness: f64,
    /// Weighted objective score before penalties.
    pub raw_score: f64,
    /// Total penalty subtracted from `raw_score`.
    pub penalty: f64,
    pub scores: ObjectiveScores,
    /// Conflicts of severity 3 or above.
    pub hard_violations: usize,
    pub soft_violations: usize,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.hard_violations == 0
    }

    /// Ranks two evaluations; `Greater` means `self` is better.
    ///
    /// Higher fitness wins. Ties go to fewer hard violations, then to the
    /// higher raw score.
    pub fn cmp_quality(&self, other: &Self) -> Ordering {
        self.fitness
            .total_cmp(&other.fitness)
            .then_with(|| other.hard_violations.cmp(&self.hard_violations))
            .then_with(|| self.raw_score.total_cmp(&other.raw_score))
    }

    /// Returns `true` if `self` ranks strictly above `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.cmp_quality(other) == Ordering::Greater
    }
}

/// A chromosome paired with its evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredChromosome {
    pub chromosome: Chromosome,
    pub evaluation: Evaluation,
}

impl ScoredChromosome {
    pub fn fitness(&self) -> f64 {
        self.evaluation.fitness
    }

    pub fn cmp_quality(&self, other: &Self) -> Ordering {
        self.evaluation.cmp_quality(&other.evaluation)
    }
}

/// Scores chromosomes against a compiled problem.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator<'a> {
    problem: &'a RosterProblem,
    hard_unit: f64,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(problem: &'a RosterProblem) -> Self {
        // Soft conflicts are overstaffing only, at most severity 2 per cell.
        let max_soft = 2.0 * (problem.days() * problem.shift_count()) as f64 * SOFT_PENALTY_UNIT;
        // The lightest hard conflict has severity 3.
        let hard_unit = (2.0 + max_soft) / 3.0;
        Self { problem, hard_unit }
    }

    pub fn problem(&self) -> &'a RosterProblem {
        self.problem
    }

    /// Penalty per unit of hard-conflict severity.
    pub fn hard_unit(&self) -> f64 {
        self.hard_unit
    }

    /// Evaluates `chromosome` using an already detected conflict list.
    pub fn evaluate(
        &self,
        chromosome: &Chromosome,
        conflicts: &[ScheduleConflict],
    ) -> OptimizeResult<Evaluation> {
        chromosome.check_dimensions(self.problem)?;
        Ok(self.combine(
            self.scores(chromosome),
            &ConflictTally::from_conflicts(conflicts),
        ))
    }

    /// Detects conflicts and evaluates in one pass.
    pub fn evaluate_chromosome(&self, chromosome: &Chromosome) -> OptimizeResult<Evaluation> {
        chromosome.check_dimensions(self.problem)?;
        Ok(self.assess(chromosome))
    }

    /// Evaluation without the dimension check. Engines only hand over
    /// chromosomes built for this problem.
    pub(crate) fn assess(&self, chromosome: &Chromosome) -> Evaluation {
        let tally = ConflictDetector::new(self.problem).tally_unchecked(chromosome);
        self.combine(self.scores(chromosome), &tally)
    }

    pub(crate) fn score(&self, chromosome: Chromosome) -> ScoredChromosome {
        let evaluation = self.assess(&chromosome);
        ScoredChromosome {
            chromosome,
            evaluation,
        }
    }

    fn combine(&self, scores: ObjectiveScores, tally: &ConflictTally) -> Evaluation {
        let raw_score = scores.weighted(self.problem.weights());
        let penalty = self.hard_unit * tally.hard_severity() as f64
            + SOFT_PENALTY_UNIT * tally.soft_severity() as f64;
        Evaluation {
            fitness: raw_score - penalty,
            raw_score,
            penalty,
            scores,
            hard_violations: tally.hard(),
            soft_violations: tally.soft(),
        }
    }

    /// The four objective scores, ignoring conflicts.
    pub fn scores(&self, chromosome: &Chromosome) -> ObjectiveScores {
        ObjectiveScores {
            fairness: self.fairness(chromosome),
            cost: self.cost(chromosome),
            efficiency: self.efficiency(chromosome),
            satisfaction: self.satisfaction(chromosome),
        }
    }

    fn fairness(&self, c: &Chromosome) -> f64 {
        let n = self.problem.employees();
        if n == 0 {
            return 1.0;
        }
        let loads: Vec<f64> = (0..n).map(|e| c.work_days(e) as f64).collect();
        let mean = loads.iter().sum::<f64>() / n as f64;
        let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n as f64;
        1.0 / (1.0 + variance)
    }

    fn cost(&self, c: &Chromosome) -> f64 {
        let p = self.problem;
        let model = p.cost_model();
        let mut actual = 0.0;
        for e in 0..p.employees() {
            for block in c.row(e).chunks(7) {
                let hours: f64 = block
                    .iter()
                    .flat_map(|g| g.shifts())
                    .map(|s| p.shift_hours(s))
                    .sum();
                let standard = model.standard_weekly_hours * block.len() as f64 / 7.0;
                actual += hours.min(standard)
                    + (hours - standard).max(0.0) * model.overtime_multiplier;
            }
        }
        if actual <= 0.0 {
            return 1.0;
        }
        let baseline = p.required_hours();
        (baseline / actual).min(1.0)
    }

    fn efficiency(&self, c: &Chromosome) -> f64 {
        let p = self.problem;
        let mut exact = 0usize;
        let mut relevant = 0usize;
        for d in 0..p.days() {
            for s in 0..p.shift_count() {
                let required = p.required(d, s);
                let assigned = c.headcount(d, s);
                if required > 0 {
                    relevant += 1;
                    if assigned == required {
                        exact += 1;
                    }
                } else if assigned > 0 {
                    relevant += 1;
                }
            }
        }
        if relevant == 0 {
            1.0
        } else {
            exact as f64 / relevant as f64
        }
    }

    fn satisfaction(&self, c: &Chromosome) -> f64 {
        let p = self.problem;
        let mut total = 0.0;
        let mut count = 0usize;
        for e in (0..p.employees()).filter(|&e| p.has_preferences(e)) {
            for (d, gene) in c.row(e).iter().enumerate() {
                for s in gene.shifts() {
                    total += p.preference(e, d, s);
                    count += 1;
                }
            }
        }
        if count == 0 {
            1.0
        } else {
            total / count as f64
        }
    }
}

/// Compiles `config` and evaluates `chromosome` against the given conflicts.
pub fn evaluate(
    chromosome: &Chromosome,
    config: &OptimizationConfig,
    conflicts: &[ScheduleConflict],
) -> OptimizeResult<Evaluation> {
    let problem = RosterProblem::new(config)?;
    FitnessEvaluator::new(&problem).evaluate(chromosome, conflicts)
}
