//! Standardized optimization result.

use std::fmt;
use std::time::Duration;

use super::algorithm::AlgorithmType;
use crate::chromosome::{Assignment, Chromosome};
use crate::conflict::{
    generate_conflict_report, ConflictDetector, ConflictKind, ConflictReport, ConflictTally,
    ScheduleConflict,
};
use crate::error::OptimizeResult;
use crate::fitness::{ObjectiveScores, ScoredChromosome};
use crate::models::RosterProblem;
use crate::run::TerminationReason;

/// Fitness at or above which a violation-free schedule is rated `High`.
pub const HIGH_QUALITY_FITNESS: f64 = 0.8;

/// Fitness below which any schedule is rated `Poor`.
pub const ACCEPTABLE_FITNESS: f64 = 0.5;

/// Coarse rating of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QualityLevel {
    High,
    Acceptable,
    Poor,
}

impl QualityLevel {
    /// Rates a schedule from its fitness and violation counters.
    ///
    /// ```
    /// use u_roster::optimizer::{QualityLevel, ViolationCounters};
    ///
    /// let clean = ViolationCounters::default();
    /// assert_eq!(QualityLevel::classify(0.9, &clean), QualityLevel::High);
    /// assert_eq!(QualityLevel::classify(0.6, &clean), QualityLevel::Acceptable);
    /// assert_eq!(QualityLevel::classify(0.3, &clean), QualityLevel::Poor);
    /// ```
    pub fn classify(fitness: f64, violations: &ViolationCounters) -> Self {
        if violations.hard > 0 || fitness < ACCEPTABLE_FITNESS {
            QualityLevel::Poor
        } else if violations.total == 0 && fitness >= HIGH_QUALITY_FITNESS {
            QualityLevel::High
        } else {
            QualityLevel::Acceptable
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QualityLevel::High => "HIGH",
            QualityLevel::Acceptable => "ACCEPTABLE",
            QualityLevel::Poor => "POOR",
        })
    }
}

/// Conflict counts of the best schedule, grouped by rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViolationCounters {
    pub consecutive_work: usize,
    pub rest_days: usize,
    /// Under- and overstaffed cells.
    pub daily_staff: usize,
    pub double_booking: usize,
    pub leave: usize,
    pub eligibility: usize,
    pub weekly_hours: usize,
    /// Conflicts of severity 3 or above.
    pub hard: usize,
    pub total: usize,
}

impl ViolationCounters {
    pub fn from_tally(tally: &ConflictTally) -> Self {
        Self {
            consecutive_work: tally.count(ConflictKind::ConsecutiveWorkExceeded),
            rest_days: tally.count(ConflictKind::InsufficientRest),
            daily_staff: tally.count(ConflictKind::Understaffed)
                + tally.count(ConflictKind::Overstaffed),
            double_booking: tally.count(ConflictKind::DoubleBooking),
            leave: tally.count(ConflictKind::OnLeave),
            eligibility: tally.count(ConflictKind::IneligibleShift),
            weekly_hours: tally.count(ConflictKind::WeeklyHoursExceeded),
            hard: tally.hard(),
            total: tally.total(),
        }
    }
}

/// Outcome of one optimization run. Produced once and owned by the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub algorithm: AlgorithmType,
    /// Seed the run used; replaying it reproduces the result.
    pub seed: u64,
    pub best_chromosome: Chromosome,
    pub best_fitness: f64,
    pub scores: ObjectiveScores,
    pub violations: ViolationCounters,
    /// Conflicts of the best schedule in report order.
    pub conflicts: Vec<ScheduleConflict>,
    /// The best schedule as concrete employee-date-shift rows.
    pub assignments: Vec<Assignment>,
    /// Generations, SA iterations, or both for the hybrid engine.
    pub iterations: usize,
    pub duration: Duration,
    /// `false` whenever the run was cut short or used up its budget.
    pub converged: bool,
    pub termination: TerminationReason,
    pub quality: QualityLevel,
    pub fitness_history: Vec<f64>,
}

impl OptimizationResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        problem: &RosterProblem,
        algorithm: AlgorithmType,
        seed: u64,
        best: ScoredChromosome,
        iterations: usize,
        duration: Duration,
        termination: TerminationReason,
        fitness_history: Vec<f64>,
    ) -> OptimizeResult<Self> {
        let conflicts = ConflictDetector::new(problem).detect(&best.chromosome)?;
        let violations = ViolationCounters::from_tally(&ConflictTally::from_conflicts(&conflicts));
        let quality = QualityLevel::classify(best.fitness(), &violations);
        let assignments = best.chromosome.to_assignments(problem);

        Ok(Self {
            algorithm,
            seed,
            best_fitness: best.fitness(),
            scores: best.evaluation.scores,
            best_chromosome: best.chromosome,
            violations,
            conflicts,
            assignments,
            iterations,
            duration,
            converged: termination == TerminationReason::Converged,
            termination,
            quality,
            fitness_history,
        })
    }

    /// `true` if the best schedule has no hard conflict.
    pub fn is_feasible(&self) -> bool {
        self.violations.hard == 0
    }

    /// Structured digest of the best schedule's conflicts.
    pub fn conflict_report(&self) -> ConflictReport {
        generate_conflict_report(&self.conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessEvaluator;
    use crate::models::{Employee, OptimizationConfig, Shift};
    use chrono::NaiveTime;

    fn problem() -> RosterProblem {
        let config = OptimizationConfig::default()
            .with_period_days(3)
            .with_shifts(vec![Shift::new(
                "day",
                "Day",
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                1,
            )])
            .with_employees(vec![Employee::new("a"), Employee::new("b")]);
        RosterProblem::new(&config).unwrap()
    }

    fn result_for(p: &RosterProblem, chromosome: Chromosome) -> OptimizationResult {
        let scored = FitnessEvaluator::new(p).score(chromosome);
        let history = vec![scored.fitness()];
        OptimizationResult::new(
            p,
            AlgorithmType::SimulatedAnnealing,
            7,
            scored,
            10,
            Duration::from_millis(3),
            TerminationReason::MaxIterations,
            history,
        )
        .unwrap()
    }

    #[test]
    fn test_infeasible_result_is_poor() {
        let p = problem();
        let result = result_for(&p, Chromosome::empty_for(&p));
        assert_eq!(result.violations.daily_staff, 3);
        assert_eq!(result.violations.hard, 3);
        assert_eq!(result.violations.total, result.conflicts.len());
        assert_eq!(result.quality, QualityLevel::Poor);
        assert!(!result.is_feasible());
        assert!(!result.converged);
        assert_eq!(result.conflict_report().needs_resolution, 3);
    }

    #[test]
    fn test_counters_and_assignments() {
        let p = problem();
        let mut c = Chromosome::empty_for(&p);
        c.assign(0, 0, 0);
        c.assign(1, 1, 0);
        c.assign(0, 2, 0);
        c.assign(1, 2, 0);
        let result = result_for(&p, c);
        assert!(result.is_feasible());
        assert_eq!(result.violations.daily_staff, 1);
        assert_eq!(result.violations.total, 1);
        assert_eq!(result.assignments.len(), 4);
        assert_eq!(result.assignments[0].shift_id, "day");
    }

    #[test]
    fn test_violations_rule_out_high() {
        let counters = ViolationCounters {
            daily_staff: 1,
            total: 1,
            ..Default::default()
        };
        assert_eq!(QualityLevel::classify(0.95, &counters), QualityLevel::Acceptable);
        let hard = ViolationCounters {
            hard: 1,
            total: 1,
            ..Default::default()
        };
        assert_eq!(QualityLevel::classify(0.95, &hard), QualityLevel::Poor);
    }
}
