//! Candidate roster encoding and genetic operators.
//!
//! A [`Chromosome`] is a flat, employee-major array of [`Gene`]s: the gene of
//! employee `e` on day `d` lives at index `e * days + d`. Cloning is a single
//! allocation, which keeps mutation and parallel evaluation cheap.

use std::fmt;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{OptimizeError, OptimizeResult};
use crate::models::{RosterProblem, MAX_SHIFTS};

/// Assignment of one employee on one day: a set of shift indices.
///
/// The empty set means the employee is off. Engines only produce off or
/// single-shift genes; more than one shift is a double booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gene(u64);

impl Gene {
    /// Day off.
    pub const OFF: Gene = Gene(0);

    /// A gene assigning exactly one shift.
    ///
    /// Shift indices at or above [`MAX_SHIFTS`] have no bit; the gene is off.
    pub fn single(shift: usize) -> Self {
        Gene(bit(shift))
    }

    /// Builds a gene from a raw shift bit-mask.
    pub fn from_mask(mask: u64) -> Self {
        Gene(mask)
    }

    pub fn mask(self) -> u64 {
        self.0
    }

    /// Returns a copy with `shift` added.
    pub fn with(self, shift: usize) -> Self {
        Gene(self.0 | bit(shift))
    }

    pub fn contains(self, shift: usize) -> bool {
        self.0 & bit(shift) != 0
    }

    /// Number of shifts assigned.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Lowest assigned shift index.
    pub fn first(self) -> Option<usize> {
        (self.0 != 0).then(|| self.0.trailing_zeros() as usize)
    }

    /// Iterates assigned shift indices in ascending order.
    pub fn shifts(self) -> impl Iterator<Item = usize> {
        let mut rest = self.0;
        std::iter::from_fn(move || {
            if rest == 0 {
                None
            } else {
                let s = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(s)
            }
        })
    }
}

fn bit(shift: usize) -> u64 {
    debug_assert!(shift < MAX_SHIFTS, "shift index {shift} out of range");
    u32::try_from(shift)
        .ok()
        .and_then(|s| 1u64.checked_shl(s))
        .unwrap_or(0)
}

/// Granularity at which two parents exchange genetic material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossoverKind {
    /// Whole employee rows are inherited from one parent.
    EmployeeRows,
    /// Whole day columns are inherited from one parent.
    ///
    /// Keeps each day's staffing pattern intact.
    #[default]
    DayColumns,
    /// Each gene is inherited independently.
    Uniform,
}

/// One concrete employee-day-shift assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub employee_id: String,
    pub day: usize,
    pub date: NaiveDate,
    pub shift_id: String,
}

/// A full-horizon employee-to-shift assignment.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chromosome {
    employees: usize,
    days: usize,
    genes: Vec<Gene>,
}

impl fmt::Debug for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Chromosome {}x{}", self.employees, self.days)?;
        for e in 0..self.employees {
            let row: Vec<String> = self
                .row(e)
                .iter()
                .map(|g| match g.count() {
                    0 => ".".to_string(),
                    1 => g.first().unwrap_or(0).to_string(),
                    _ => "*".to_string(),
                })
                .collect();
            writeln!(f, "  {e:>3}: {}", row.join(" "))?;
        }
        Ok(())
    }
}

impl Chromosome {
    /// An all-off chromosome.
    pub fn empty(employees: usize, days: usize) -> Self {
        Self {
            employees,
            days,
            genes: vec![Gene::OFF; employees * days],
        }
    }

    /// An all-off chromosome sized for `problem`.
    pub fn empty_for(problem: &RosterProblem) -> Self {
        Self::empty(problem.employees(), problem.days())
    }

    /// Builds a chromosome from per-employee rows.
    ///
    /// Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Gene>>) -> OptimizeResult<Self> {
        let employees = rows.len();
        let days = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != days) {
            return Err(OptimizeError::DimensionMismatch {
                expected: (employees, days),
                actual: (employees, bad.len()),
            });
        }
        Ok(Self {
            employees,
            days,
            genes: rows.into_iter().flatten().collect(),
        })
    }

    pub fn employees(&self) -> usize {
        self.employees
    }

    pub fn days(&self) -> usize {
        self.days
    }

    /// `(employees, days)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.employees, self.days)
    }

    /// Fails unless the chromosome was built for `problem`'s dimensions.
    pub fn check_dimensions(&self, problem: &RosterProblem) -> OptimizeResult<()> {
        if self.dimensions() == problem.dimensions() {
            Ok(())
        } else {
            Err(OptimizeError::DimensionMismatch {
                expected: problem.dimensions(),
                actual: self.dimensions(),
            })
        }
    }

    /// The flat gene array, employee-major.
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn gene(&self, employee: usize, day: usize) -> Gene {
        self.genes[employee * self.days + day]
    }

    pub fn set_gene(&mut self, employee: usize, day: usize, gene: Gene) {
        self.genes[employee * self.days + day] = gene;
    }

    /// Assigns exactly `shift`, replacing whatever was there.
    pub fn assign(&mut self, employee: usize, day: usize, shift: usize) {
        self.set_gene(employee, day, Gene::single(shift));
    }

    /// Adds `shift` to the employee's day, keeping existing shifts.
    pub fn add_shift(&mut self, employee: usize, day: usize, shift: usize) {
        let idx = employee * self.days + day;
        self.genes[idx] = self.genes[idx].with(shift);
    }

    /// Marks the employee off on `day`.
    pub fn clear(&mut self, employee: usize, day: usize) {
        self.set_gene(employee, day, Gene::OFF);
    }

    /// All genes of one employee.
    pub fn row(&self, employee: usize) -> &[Gene] {
        let start = employee * self.days;
        &self.genes[start..start + self.days]
    }

    /// Number of days the employee works at least one shift.
    pub fn work_days(&self, employee: usize) -> usize {
        self.row(employee).iter().filter(|g| !g.is_off()).count()
    }

    /// Number of employees assigned to `shift` on `day`.
    pub fn headcount(&self, day: usize, shift: usize) -> u32 {
        (0..self.employees)
            .filter(|&e| self.gene(e, day).contains(shift))
            .count() as u32
    }

    /// Random chromosome whose expected workload matches total demand.
    ///
    /// Respects eligibility and leave; staffing and labor limits are left to
    /// the search.
    pub fn random<R: Rng>(problem: &RosterProblem, rng: &mut R) -> Self {
        let mut c = Self::empty_for(problem);
        let cells = (problem.employees() * problem.days()) as f64;
        let density = (problem.total_required() as f64 / cells).clamp(0.0, 1.0);
        for e in 0..problem.employees() {
            for d in 0..problem.days() {
                if !problem.is_on_leave(e, d) && rng.random_bool(density) {
                    c.set_gene(e, d, problem.random_work_gene(e, rng));
                }
            }
        }
        c
    }

    /// Greedy least-loaded construction.
    ///
    /// Fills every (day, shift) cell, day by day, from eligible employees who
    /// are not on leave, not yet working that day, and can take the shift
    /// without breaking the consecutive-day limit, the rolling rest window, or
    /// the weekly hour cap. Ties between equally loaded candidates are broken
    /// randomly. Cells that cannot be filled legally stay understaffed.
    pub fn greedy<R: Rng>(problem: &RosterProblem, rng: &mut R) -> Self {
        let mut c = Self::empty_for(problem);
        let mut load = vec![0usize; problem.employees()];
        let mut shift_order: Vec<usize> = (0..problem.shift_count()).collect();
        let mut candidates = Vec::with_capacity(problem.employees());

        for d in 0..problem.days() {
            shift_order.shuffle(rng);
            for &s in &shift_order {
                let need = problem.required(d, s) as usize;
                if need == 0 {
                    continue;
                }
                candidates.clear();
                candidates.extend(
                    (0..problem.employees()).filter(|&e| c.can_take(problem, e, d, s)),
                );
                candidates.shuffle(rng);
                candidates.sort_by_key(|&e| load[e]);
                for &e in candidates.iter().take(need) {
                    c.assign(e, d, s);
                    load[e] += 1;
                }
            }
        }
        c
    }

    /// Whether assigning `shift` to `employee` on `day` keeps every labor rule,
    /// assuming days after `day` are still off.
    fn can_take(&self, problem: &RosterProblem, employee: usize, day: usize, shift: usize) -> bool {
        if !problem.is_eligible(employee, shift)
            || problem.is_on_leave(employee, day)
            || !self.gene(employee, day).is_off()
        {
            return false;
        }

        let row = self.row(employee);
        let limit = problem.constraints().max_consecutive_work_days as usize;
        let run = row[..day].iter().rev().take_while(|g| !g.is_off()).count();
        if run + 1 > limit {
            return false;
        }

        let window = problem.rest_window();
        let rest = problem.required_rest();
        let cap = problem.constraints().max_weekly_hours;
        let first = (day + 1).saturating_sub(window);
        let last = day.min(problem.days() - window);
        for start in first..=last {
            let span = &row[start..start + window];
            let off = span
                .iter()
                .enumerate()
                .filter(|(i, g)| g.is_off() && start + i != day)
                .count();
            if off < rest {
                return false;
            }
            if let Some(cap) = cap {
                let hours: f64 = span
                    .iter()
                    .flat_map(|g| g.shifts())
                    .map(|s| problem.shift_hours(s))
                    .sum::<f64>()
                    + problem.shift_hours(shift);
                if hours > cap {
                    return false;
                }
            }
        }
        true
    }

    /// Recombines two parents into two complementary children.
    pub fn crossover<R: Rng>(&self, other: &Self, kind: CrossoverKind, rng: &mut R) -> (Self, Self) {
        debug_assert_eq!(self.dimensions(), other.dimensions());
        let mut a = self.clone();
        let mut b = other.clone();
        match kind {
            CrossoverKind::EmployeeRows => {
                for e in 0..self.employees {
                    if rng.random_bool(0.5) {
                        let range = e * self.days..(e + 1) * self.days;
                        a.genes[range.clone()].copy_from_slice(&other.genes[range.clone()]);
                        b.genes[range.clone()].copy_from_slice(&self.genes[range]);
                    }
                }
            }
            CrossoverKind::DayColumns => {
                for d in 0..self.days {
                    if rng.random_bool(0.5) {
                        for e in 0..self.employees {
                            a.set_gene(e, d, other.gene(e, d));
                            b.set_gene(e, d, self.gene(e, d));
                        }
                    }
                }
            }
            CrossoverKind::Uniform => {
                for i in 0..self.genes.len() {
                    if rng.random_bool(0.5) {
                        a.genes[i] = other.genes[i];
                        b.genes[i] = self.genes[i];
                    }
                }
            }
        }
        (a, b)
    }

    /// Visits every gene and mutates it with probability `rate`.
    ///
    /// A mutation either reassigns the gene or swaps it with another
    /// employee's gene on the same day. Returns the number of mutations.
    pub fn mutate<R: Rng>(&mut self, problem: &RosterProblem, rate: f64, rng: &mut R) -> usize {
        let mut mutated = 0;
        for e in 0..self.employees {
            for d in 0..self.days {
                if rng.random_bool(rate) {
                    self.mutate_gene(problem, e, d, rng);
                    mutated += 1;
                }
            }
        }
        mutated
    }

    /// Applies `moves` random gene mutations. Used as the SA neighborhood.
    pub fn perturb<R: Rng>(&mut self, problem: &RosterProblem, moves: usize, rng: &mut R) {
        if self.genes.is_empty() {
            return;
        }
        for _ in 0..moves.max(1) {
            let e = rng.random_range(0..self.employees);
            let d = rng.random_range(0..self.days);
            self.mutate_gene(problem, e, d, rng);
        }
    }

    fn mutate_gene<R: Rng>(&mut self, problem: &RosterProblem, employee: usize, day: usize, rng: &mut R) {
        if self.employees > 1 && rng.random_bool(0.5) {
            let mut other = rng.random_range(0..self.employees - 1);
            if other >= employee {
                other += 1;
            }
            let a = employee * self.days + day;
            let b = other * self.days + day;
            self.genes.swap(a, b);
            return;
        }
        let gene = if problem.is_on_leave(employee, day) {
            Gene::OFF
        } else {
            let options = problem.eligible_mask(employee).count_ones() + 1;
            if rng.random_range(0..options) == 0 {
                Gene::OFF
            } else {
                problem.random_work_gene(employee, rng)
            }
        };
        self.set_gene(employee, day, gene);
    }

    /// Expands the chromosome into concrete assignments, employee-major.
    pub fn to_assignments(&self, problem: &RosterProblem) -> Vec<Assignment> {
        let mut out = Vec::new();
        for e in 0..self.employees {
            for d in 0..self.days {
                for s in self.gene(e, d).shifts() {
                    out.push(Assignment {
                        employee_id: problem.employee_id(e).to_string(),
                        day: d,
                        date: problem.date(d),
                        shift_id: problem.shift_id(s).to_string(),
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, LaborConstraints, OptimizationConfig, Shift};
    use crate::random::create_rng;
    use chrono::NaiveTime;

    #[test]
    fn test_highest_shift_bit() {
        let gene = Gene::single(MAX_SHIFTS - 1);
        assert!(gene.contains(MAX_SHIFTS - 1));
        assert_eq!(gene.first(), Some(MAX_SHIFTS - 1));
        assert_eq!(gene.with(0).count(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_shift_is_caught() {
        Chromosome::empty(1, 1).assign(0, 0, MAX_SHIFTS);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_out_of_range_shift_is_ignored() {
        let mut c = Chromosome::empty(1, 1);
        c.add_shift(0, 0, MAX_SHIFTS + 3);
        assert!(c.gene(0, 0).is_off());
        assert!(!Gene::single(1).contains(MAX_SHIFTS));
    }

    fn problem(employees: usize, days: usize, headcount: u32) -> RosterProblem {
        let shift = Shift::new(
            "day",
            "Day",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            headcount,
        );
        let config = OptimizationConfig::default()
            .with_period_days(days)
            .with_shifts(vec![shift])
            .with_employees((0..employees).map(|i| Employee::new(format!("e{i}"))).collect())
            .with_constraints(
                LaborConstraints::default()
                    .with_max_consecutive_work_days(5)
                    .with_min_rest_days_per_week(1),
            );
        RosterProblem::new(&config).unwrap()
    }

    #[test]
    fn test_gene_set_operations() {
        let g = Gene::single(2).with(5);
        assert_eq!(g.count(), 2);
        assert!(g.contains(2) && g.contains(5));
        assert_eq!(g.first(), Some(2));
        assert_eq!(g.shifts().collect::<Vec<_>>(), vec![2, 5]);
        assert!(Gene::OFF.is_off());
        assert_eq!(Gene::OFF.first(), None);
    }

    #[test]
    fn test_flat_indexing() {
        let mut c = Chromosome::empty(3, 4);
        c.assign(1, 2, 0);
        assert_eq!(c.genes()[6], Gene::single(0));
        assert_eq!(c.work_days(1), 1);
        assert_eq!(c.headcount(2, 0), 1);
        c.clear(1, 2);
        assert_eq!(c.work_days(1), 0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Chromosome::from_rows(vec![vec![Gene::OFF; 3], vec![Gene::OFF; 2]]).unwrap_err();
        assert!(matches!(err, OptimizeError::DimensionMismatch { .. }));
        let ok = Chromosome::from_rows(vec![vec![Gene::OFF; 3]; 2]).unwrap();
        assert_eq!(ok.dimensions(), (2, 3));
    }

    #[test]
    fn test_greedy_meets_easy_demand() {
        let p = problem(5, 7, 2);
        let mut rng = create_rng(11);
        let c = Chromosome::greedy(&p, &mut rng);
        for d in 0..7 {
            assert_eq!(c.headcount(d, 0), 2, "day {d}");
        }
        for e in 0..5 {
            assert!(c.work_days(e) <= 6);
        }
    }

    #[test]
    fn test_greedy_leaves_cell_short_rather_than_break_rules() {
        // Day 5 would be a sixth consecutive day; day 6 is still legal.
        let p = problem(1, 7, 1);
        let mut rng = create_rng(1);
        let c = Chromosome::greedy(&p, &mut rng);
        assert_eq!(c.work_days(0), 6);
        assert!(c.gene(0, 5).is_off());
    }

    #[test]
    fn test_random_respects_dimensions() {
        let p = problem(4, 10, 2);
        let mut rng = create_rng(5);
        let c = Chromosome::random(&p, &mut rng);
        assert_eq!(c.dimensions(), (4, 10));
        assert!(c.check_dimensions(&p).is_ok());
        assert!(Chromosome::empty(3, 10).check_dimensions(&p).is_err());
    }

    #[test]
    fn test_day_column_crossover_keeps_columns() {
        let p = problem(3, 6, 1);
        let mut rng = create_rng(2);
        let a = Chromosome::random(&p, &mut rng);
        let b = Chromosome::random(&p, &mut rng);
        let (c1, c2) = a.crossover(&b, CrossoverKind::DayColumns, &mut rng);
        for d in 0..6 {
            let from_a = (0..3).all(|e| c1.gene(e, d) == a.gene(e, d));
            let from_b = (0..3).all(|e| c1.gene(e, d) == b.gene(e, d));
            assert!(from_a || from_b);
            for e in 0..3 {
                let pair = (c1.gene(e, d), c2.gene(e, d));
                assert!(pair == (a.gene(e, d), b.gene(e, d)) || pair == (b.gene(e, d), a.gene(e, d)));
            }
        }
    }

    #[test]
    fn test_mutation_rate_zero_is_identity() {
        let p = problem(3, 5, 1);
        let mut rng = create_rng(9);
        let original = Chromosome::random(&p, &mut rng);
        let mut c = original.clone();
        assert_eq!(c.mutate(&p, 0.0, &mut rng), 0);
        assert_eq!(c, original);
        assert_eq!(c.mutate(&p, 1.0, &mut rng), 15);
    }

    #[test]
    fn test_to_assignments() {
        let p = problem(2, 3, 1);
        let mut c = Chromosome::empty_for(&p);
        c.assign(1, 2, 0);
        let a = c.to_assignments(&p);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].employee_id, "e1");
        assert_eq!(a[0].day, 2);
        assert_eq!(a[0].shift_id, "day");
    }
}
