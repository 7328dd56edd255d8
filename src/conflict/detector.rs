//! Rule checks over a chromosome.
//!
//! Every check walks the chromosome once and reports into a sink. The
//! public API materializes [`ScheduleConflict`]s; the fitness hot path only
//! tallies severities, so descriptions are never formatted there.

use super::types::{ConflictKind, ConflictTally, ConflictType, ScheduleConflict, Severity};
use crate::chromosome::{Chromosome, Gene};
use crate::error::OptimizeResult;
use crate::models::{OptimizationConfig, RosterProblem};

/// Where a conflict is anchored.
#[derive(Clone, Copy)]
struct Location {
    employee: Option<usize>,
    day: usize,
    shift: Option<usize>,
}

trait Sink {
    fn record<F>(&mut self, kind: ConflictKind, severity: Severity, at: Location, describe: F)
    where
        F: FnOnce() -> String;
}

impl Sink for ConflictTally {
    fn record<F>(&mut self, kind: ConflictKind, severity: Severity, _at: Location, _describe: F)
    where
        F: FnOnce() -> String,
    {
        ConflictTally::record(self, kind, severity);
    }
}

struct Collector<'a> {
    problem: &'a RosterProblem,
    conflicts: Vec<ScheduleConflict>,
}

impl Sink for Collector<'_> {
    fn record<F>(&mut self, kind: ConflictKind, severity: Severity, at: Location, describe: F)
    where
        F: FnOnce() -> String,
    {
        self.conflicts.push(ScheduleConflict {
            conflict_type: kind.conflict_type(),
            kind,
            severity,
            description: describe(),
            employee_index: at.employee,
            employee_id: at.employee.map(|e| self.problem.employee_id(e).to_string()),
            day: at.day,
            shift_index: at.shift,
            shift_id: at.shift.map(|s| self.problem.shift_id(s).to_string()),
        });
    }
}

/// Detects schedule conflicts against a compiled problem.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_roster::chromosome::Chromosome;
/// use u_roster::conflict::{ConflictDetector, ConflictType};
/// use u_roster::models::{Employee, OptimizationConfig, RosterProblem, Shift};
///
/// let config = OptimizationConfig::default()
///     .with_period_days(7)
///     .with_shifts(vec![Shift::new(
///         "day",
///         "Day",
///         NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///         NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
///         1,
///     )])
///     .with_employees(vec![Employee::new("a")]);
/// let problem = RosterProblem::new(&config).unwrap();
/// let detector = ConflictDetector::new(&problem);
///
/// // Nobody works: every day is understaffed.
/// let conflicts = detector.detect(&Chromosome::empty_for(&problem)).unwrap();
/// assert_eq!(conflicts.len(), 7);
/// assert!(conflicts.iter().all(|c| c.conflict_type == ConflictType::Date));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    problem: &'a RosterProblem,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(problem: &'a RosterProblem) -> Self {
        Self { problem }
    }

    pub fn problem(&self) -> &'a RosterProblem {
        self.problem
    }

    /// Full scan: every conflict of every category, in report order.
    pub fn detect(&self, chromosome: &Chromosome) -> OptimizeResult<Vec<ScheduleConflict>> {
        chromosome.check_dimensions(self.problem)?;
        let mut sink = self.collector();
        self.scan_employees(chromosome, 0..self.problem.employees(), &mut sink);
        self.scan_eligibility(chromosome, 0..self.problem.employees(), &mut sink);
        self.scan_staffing(chromosome, &mut sink);
        Ok(finish(sink))
    }

    /// Double booking, leave, consecutive work, rest and weekly hours.
    pub fn detect_employee_conflicts(
        &self,
        chromosome: &Chromosome,
    ) -> OptimizeResult<Vec<ScheduleConflict>> {
        chromosome.check_dimensions(self.problem)?;
        let mut sink = self.collector();
        self.scan_employees(chromosome, 0..self.problem.employees(), &mut sink);
        Ok(finish(sink))
    }

    /// Assignments to shifts the employee is not eligible for.
    pub fn detect_shift_conflicts(
        &self,
        chromosome: &Chromosome,
    ) -> OptimizeResult<Vec<ScheduleConflict>> {
        chromosome.check_dimensions(self.problem)?;
        let mut sink = self.collector();
        self.scan_eligibility(chromosome, 0..self.problem.employees(), &mut sink);
        Ok(finish(sink))
    }

    /// Under- and overstaffed (day, shift) cells.
    pub fn detect_date_conflicts(
        &self,
        chromosome: &Chromosome,
    ) -> OptimizeResult<Vec<ScheduleConflict>> {
        chromosome.check_dimensions(self.problem)?;
        let mut sink = self.collector();
        self.scan_staffing(chromosome, &mut sink);
        Ok(finish(sink))
    }

    /// Conflicts of the given category only.
    pub fn detect_by_type(
        &self,
        chromosome: &Chromosome,
        conflict_type: ConflictType,
    ) -> OptimizeResult<Vec<ScheduleConflict>> {
        match conflict_type {
            ConflictType::Employee => self.detect_employee_conflicts(chromosome),
            ConflictType::Shift => self.detect_shift_conflicts(chromosome),
            ConflictType::Date => self.detect_date_conflicts(chromosome),
        }
    }

    /// Conflicts referencing one employee. Staffing conflicts reference no
    /// employee and are never included.
    ///
    /// An out-of-range index yields no conflicts.
    pub fn detect_for_employee(
        &self,
        chromosome: &Chromosome,
        employee: usize,
    ) -> OptimizeResult<Vec<ScheduleConflict>> {
        chromosome.check_dimensions(self.problem)?;
        let mut sink = self.collector();
        if employee < self.problem.employees() {
            self.scan_employees(chromosome, employee..employee + 1, &mut sink);
            self.scan_eligibility(chromosome, employee..employee + 1, &mut sink);
        }
        Ok(finish(sink))
    }

    /// Counts conflicts by kind and severity without materializing them.
    pub fn tally(&self, chromosome: &Chromosome) -> OptimizeResult<ConflictTally> {
        chromosome.check_dimensions(self.problem)?;
        Ok(self.tally_unchecked(chromosome))
    }

    pub(crate) fn tally_unchecked(&self, chromosome: &Chromosome) -> ConflictTally {
        let mut tally = ConflictTally::default();
        self.scan_employees(chromosome, 0..self.problem.employees(), &mut tally);
        self.scan_eligibility(chromosome, 0..self.problem.employees(), &mut tally);
        self.scan_staffing(chromosome, &mut tally);
        tally
    }

    /// Returns `true` if no hard conflict exists.
    pub fn is_feasible(&self, chromosome: &Chromosome) -> OptimizeResult<bool> {
        Ok(self.tally(chromosome)?.hard() == 0)
    }

    fn collector(&self) -> Collector<'a> {
        Collector {
            problem: self.problem,
            conflicts: Vec::new(),
        }
    }

    fn scan_employees<S: Sink>(
        &self,
        c: &Chromosome,
        employees: std::ops::Range<usize>,
        sink: &mut S,
    ) {
        let p = self.problem;
        for e in employees {
            let row = c.row(e);
            for (d, gene) in row.iter().enumerate() {
                if gene.count() > 1 {
                    sink.record(
                        ConflictKind::DoubleBooking,
                        Severity::Severe,
                        Location { employee: Some(e), day: d, shift: gene.first() },
                        || {
                            let ids: Vec<&str> = gene.shifts().map(|s| p.shift_id(s)).collect();
                            format!(
                                "employee '{}' is booked on {} shifts ({}) on {}",
                                p.employee_id(e),
                                ids.len(),
                                ids.join(", "),
                                p.date(d)
                            )
                        },
                    );
                }
                if !gene.is_off() && p.is_on_leave(e, d) {
                    sink.record(
                        ConflictKind::OnLeave,
                        Severity::Severe,
                        Location { employee: Some(e), day: d, shift: gene.first() },
                        || format!("employee '{}' is on leave on {}", p.employee_id(e), p.date(d)),
                    );
                }
            }
            self.scan_consecutive(e, row, sink);
            self.scan_rest(e, row, sink);
            self.scan_weekly_hours(e, row, sink);
        }
    }

    fn scan_consecutive<S: Sink>(&self, e: usize, row: &[Gene], sink: &mut S) {
        let p = self.problem;
        let limit = p.constraints().max_consecutive_work_days as usize;
        let mut d = 0;
        while d < row.len() {
            if row[d].is_off() {
                d += 1;
                continue;
            }
            let start = d;
            while d < row.len() && !row[d].is_off() {
                d += 1;
            }
            let run = d - start;
            if run > limit {
                sink.record(
                    ConflictKind::ConsecutiveWorkExceeded,
                    Severity::High,
                    Location { employee: Some(e), day: start + limit, shift: None },
                    || {
                        format!(
                            "employee '{}' works {run} consecutive days from {} (limit {limit})",
                            p.employee_id(e),
                            p.date(start)
                        )
                    },
                );
            }
        }
    }

    fn scan_rest<S: Sink>(&self, e: usize, row: &[Gene], sink: &mut S) {
        let p = self.problem;
        let required = p.required_rest();
        if required == 0 {
            return;
        }
        let window = p.rest_window();
        let violating = |start: usize| {
            row[start..start + window].iter().filter(|g| g.is_off()).count() < required
        };
        for_each_violating_run(row.len(), window, violating, |first, last| {
            sink.record(
                ConflictKind::InsufficientRest,
                Severity::High,
                Location { employee: Some(e), day: first, shift: None },
                || {
                    format!(
                        "employee '{}' has fewer than {required} rest day(s) in every {window}-day window from {} to {}",
                        p.employee_id(e),
                        p.date(first),
                        p.date(last + window - 1)
                    )
                },
            );
        });
    }

    fn scan_weekly_hours<S: Sink>(&self, e: usize, row: &[Gene], sink: &mut S) {
        let p = self.problem;
        let Some(cap) = p.constraints().max_weekly_hours else {
            return;
        };
        let window = p.rest_window();
        let hours = |start: usize| -> f64 {
            row[start..start + window]
                .iter()
                .flat_map(|g| g.shifts())
                .map(|s| p.shift_hours(s))
                .sum()
        };
        for_each_violating_run(row.len(), window, |start| hours(start) > cap, |first, last| {
            sink.record(
                ConflictKind::WeeklyHoursExceeded,
                Severity::High,
                Location { employee: Some(e), day: first, shift: None },
                || {
                    format!(
                        "employee '{}' exceeds {cap} hours per {window}-day window between {} and {}",
                        p.employee_id(e),
                        p.date(first),
                        p.date(last + window - 1)
                    )
                },
            );
        });
    }

    fn scan_eligibility<S: Sink>(
        &self,
        c: &Chromosome,
        employees: std::ops::Range<usize>,
        sink: &mut S,
    ) {
        let p = self.problem;
        for e in employees {
            let ineligible = !p.eligible_mask(e) & p.all_shifts_mask();
            for (d, gene) in c.row(e).iter().enumerate() {
                if gene.mask() & ineligible == 0 {
                    continue;
                }
                for s in gene.shifts().filter(|&s| !p.is_eligible(e, s)) {
                    sink.record(
                        ConflictKind::IneligibleShift,
                        Severity::Severe,
                        Location { employee: Some(e), day: d, shift: Some(s) },
                        || {
                            format!(
                                "employee '{}' is not eligible for shift '{}' on {}",
                                p.employee_id(e),
                                p.shift_id(s),
                                p.date(d)
                            )
                        },
                    );
                }
            }
        }
    }

    fn scan_staffing<S: Sink>(&self, c: &Chromosome, sink: &mut S) {
        let p = self.problem;
        for d in 0..p.days() {
            for s in 0..p.shift_count() {
                let required = p.required(d, s);
                let assigned = c.headcount(d, s);
                let at = Location { employee: None, day: d, shift: Some(s) };
                if assigned < required {
                    sink.record(ConflictKind::Understaffed, Severity::High, at, || {
                        format!(
                            "shift '{}' on {} has {assigned} of {required} required staff",
                            p.shift_id(s),
                            p.date(d)
                        )
                    });
                } else if assigned > required {
                    let severity = if assigned - required == 1 {
                        Severity::Low
                    } else {
                        Severity::Moderate
                    };
                    sink.record(ConflictKind::Overstaffed, severity, at, || {
                        format!(
                            "shift '{}' on {} has {assigned} staff, {required} required",
                            p.shift_id(s),
                            p.date(d)
                        )
                    });
                }
            }
        }
    }
}

/// Calls `report(first, last)` once per maximal run of consecutive window
/// starts for which `violating` holds.
fn for_each_violating_run<V, R>(days: usize, window: usize, violating: V, mut report: R)
where
    V: Fn(usize) -> bool,
    R: FnMut(usize, usize),
{
    if window == 0 || days < window {
        return;
    }
    let mut run_start: Option<usize> = None;
    for start in 0..=days - window {
        match (violating(start), run_start) {
            (true, None) => run_start = Some(start),
            (false, Some(first)) => {
                report(first, start - 1);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(first) = run_start {
        report(first, days - window);
    }
}

fn finish(sink: Collector<'_>) -> Vec<ScheduleConflict> {
    let mut conflicts = sink.conflicts;
    conflicts.sort_by(ScheduleConflict::report_order);
    conflicts
}

/// Compiles `config` and runs a full scan.
pub fn detect_conflicts(
    chromosome: &Chromosome,
    config: &OptimizationConfig,
) -> OptimizeResult<Vec<ScheduleConflict>> {
    let problem = RosterProblem::new(config)?;
    ConflictDetector::new(&problem).detect(chromosome)
}

/// Compiles `config` and returns the conflicts referencing one employee.
pub fn detect_conflicts_for_employee(
    chromosome: &Chromosome,
    config: &OptimizationConfig,
    employee: usize,
) -> OptimizeResult<Vec<ScheduleConflict>> {
    let problem = RosterProblem::new(config)?;
    ConflictDetector::new(&problem).detect_for_employee(chromosome, employee)
}
