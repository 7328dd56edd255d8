//! Compiled, index-based view of an [`OptimizationConfig`].
//!
//! Engines never look up employees or shifts by string id in their inner
//! loops. [`RosterProblem`] resolves every id, date, weekday override and
//! staffing override once, up front, into flat arrays.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::Rng;

use super::config::{CostModel, LaborConstraints, OptimizationConfig};
use crate::chromosome::Gene;
use crate::error::ConfigError;

/// Read-only problem instance shared by every engine during a run.
#[derive(Debug, Clone)]
pub struct RosterProblem {
    employees: usize,
    days: usize,
    shift_count: usize,
    start_date: NaiveDate,
    dates: Vec<NaiveDate>,
    employee_ids: Vec<String>,
    shift_ids: Vec<String>,
    shift_hours: Vec<f64>,
    /// Required headcount, indexed `day * shift_count + shift`.
    requirements: Vec<u32>,
    /// Eligible shift set per employee.
    eligibility: Vec<u64>,
    all_shifts: u64,
    /// Leave flag, indexed `employee * days + day`.
    leave: Vec<bool>,
    /// Shift preference weight, indexed `employee * shift_count + shift`.
    pref_shift: Vec<f64>,
    /// Weekday preference weight resolved per day, indexed `employee * days + day`.
    pref_day: Vec<f64>,
    has_preferences: Vec<bool>,
    constraints: LaborConstraints,
    weights: [f64; 4],
    cost: CostModel,
}

impl RosterProblem {
    /// Validates `config` and compiles it.
    pub fn new(config: &OptimizationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let employees = config.employees.len();
        let days = config.period_days;
        let shift_count = config.shifts.len();

        let dates: Vec<NaiveDate> = (0..days)
            .map(|d| {
                config
                    .start_date
                    .checked_add_days(Days::new(d as u64))
                    .unwrap_or(NaiveDate::MAX)
            })
            .collect();

        let shift_ids: Vec<String> = config.shifts.iter().map(|s| s.id.clone()).collect();
        let shift_hours: Vec<f64> = config.shifts.iter().map(|s| s.duration_hours()).collect();
        let shift_index = |id: &str| shift_ids.iter().position(|s| s == id);

        let mut requirements = Vec::with_capacity(days * shift_count);
        for date in &dates {
            let weekday = date.weekday();
            requirements.extend(config.shifts.iter().map(|s| s.headcount_on(weekday)));
        }
        for req in &config.staffing {
            if let Some(s) = shift_index(&req.shift_id) {
                requirements[req.day * shift_count + s] = req.headcount;
            }
        }

        let all_shifts = if shift_count == 64 {
            u64::MAX
        } else {
            (1u64 << shift_count) - 1
        };

        let mut eligibility = Vec::with_capacity(employees);
        let mut leave = vec![false; employees * days];
        let mut pref_shift = vec![0.0; employees * shift_count];
        let mut pref_day = vec![0.0; employees * days];
        let mut has_preferences = Vec::with_capacity(employees);

        for (e, employee) in config.employees.iter().enumerate() {
            let mask = shift_ids
                .iter()
                .enumerate()
                .filter(|(_, id)| employee.can_work(id))
                .fold(0u64, |m, (s, _)| m | (1u64 << s));
            eligibility.push(mask);

            for (d, date) in dates.iter().enumerate() {
                leave[e * days + d] = employee.is_on_leave(*date);
                pref_day[e * days + d] = employee
                    .preferences
                    .weekdays
                    .get(&date.weekday())
                    .copied()
                    .unwrap_or(0.0);
            }
            for (id, weight) in &employee.preferences.shifts {
                if let Some(s) = shift_index(id) {
                    pref_shift[e * shift_count + s] = *weight;
                }
            }
            has_preferences.push(!employee.preferences.is_empty());
        }

        Ok(Self {
            employees,
            days,
            shift_count,
            start_date: config.start_date,
            dates,
            employee_ids: config.employees.iter().map(|e| e.id.clone()).collect(),
            shift_ids,
            shift_hours,
            requirements,
            eligibility,
            all_shifts,
            leave,
            pref_shift,
            pref_day,
            has_preferences,
            constraints: config.constraints,
            weights: config.weights.normalized(),
            cost: config.cost,
        })
    }

    pub fn employees(&self) -> usize {
        self.employees
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn shift_count(&self) -> usize {
        self.shift_count
    }

    /// `(employees, days)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.employees, self.days)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Calendar date of day index `day`.
    pub fn date(&self, day: usize) -> NaiveDate {
        self.dates[day]
    }

    pub fn weekday(&self, day: usize) -> Weekday {
        self.dates[day].weekday()
    }

    pub fn employee_id(&self, employee: usize) -> &str {
        &self.employee_ids[employee]
    }

    pub fn shift_id(&self, shift: usize) -> &str {
        &self.shift_ids[shift]
    }

    pub fn shift_hours(&self, shift: usize) -> f64 {
        self.shift_hours[shift]
    }

    /// Required headcount for `shift` on `day`.
    pub fn required(&self, day: usize, shift: usize) -> u32 {
        self.requirements[day * self.shift_count + shift]
    }

    /// Sum of required headcount over every cell.
    pub fn total_required(&self) -> u64 {
        self.requirements.iter().map(|&r| r as u64).sum()
    }

    /// Hours implied by meeting every requirement exactly.
    pub fn required_hours(&self) -> f64 {
        self.requirements
            .iter()
            .enumerate()
            .map(|(i, &r)| r as f64 * self.shift_hours[i % self.shift_count])
            .sum()
    }

    /// Set of shifts `employee` may work, as a bitmask.
    pub fn eligible_mask(&self, employee: usize) -> u64 {
        self.eligibility[employee]
    }

    pub fn all_shifts_mask(&self) -> u64 {
        self.all_shifts
    }

    pub fn is_eligible(&self, employee: usize, shift: usize) -> bool {
        self.eligibility[employee] & (1u64 << shift) != 0
    }

    pub fn is_on_leave(&self, employee: usize, day: usize) -> bool {
        self.leave[employee * self.days + day]
    }

    /// Combined preference weight for `employee` working `shift` on `day`, capped at 1.
    pub fn preference(&self, employee: usize, day: usize, shift: usize) -> f64 {
        let w = self.pref_shift[employee * self.shift_count + shift]
            + self.pref_day[employee * self.days + day];
        w.min(1.0)
    }

    pub fn has_preferences(&self, employee: usize) -> bool {
        self.has_preferences[employee]
    }

    pub fn constraints(&self) -> &LaborConstraints {
        &self.constraints
    }

    /// Normalized `[fairness, cost, efficiency, satisfaction]` weights.
    pub fn weights(&self) -> [f64; 4] {
        self.weights
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Length of the rolling rest window: one week, or the whole horizon if shorter.
    pub fn rest_window(&self) -> usize {
        self.days.min(7)
    }

    /// Rest days required inside one rest window.
    ///
    /// Horizons shorter than a week scale the weekly minimum down, rounding down.
    pub fn required_rest(&self) -> usize {
        let weekly = self.constraints.min_rest_days_per_week as usize;
        if self.days >= 7 {
            weekly
        } else {
            weekly * self.days / 7
        }
    }

    /// A single-shift gene drawn uniformly from the employee's eligible shifts.
    ///
    /// Returns [`Gene::OFF`] if the employee is eligible for nothing.
    pub fn random_work_gene<R: Rng>(&self, employee: usize, rng: &mut R) -> Gene {
        let mask = self.eligibility[employee];
        let count = mask.count_ones();
        if count == 0 {
            return Gene::OFF;
        }
        let pick = rng.random_range(0..count);
        let shift = (0..self.shift_count)
            .filter(|&s| mask & (1u64 << s) != 0)
            .nth(pick as usize)
            .unwrap_or(0);
        Gene::single(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, Shift, StaffingRequirement};
    use crate::random::create_rng;
    use chrono::NaiveTime;

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn config() -> OptimizationConfig {
        // 2025-03-03 is a Monday.
        OptimizationConfig::default()
            .with_start_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .with_period_days(7)
            .with_shifts(vec![
                Shift::new("day", "Day", time(8), time(16), 2)
                    .with_weekday_headcount(Weekday::Sun, 1),
                Shift::new("night", "Night", time(22), time(6), 1),
            ])
            .with_employees(vec![
                Employee::new("a"),
                Employee::new("b")
                    .with_eligible_shifts(["night"])
                    .with_leave_date(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())
                    .with_shift_preference("night", 0.7)
                    .with_weekday_preference(Weekday::Fri, 0.6),
            ])
            .with_staffing(vec![StaffingRequirement::new("day", 6, 4)])
    }

    #[test]
    fn test_requirement_precedence() {
        let p = RosterProblem::new(&config()).unwrap();
        assert_eq!(p.required(0, 0), 2);
        assert_eq!(p.required(0, 1), 1);
        // Sunday cell carries both a weekday override and a cell override.
        assert_eq!(p.weekday(6), Weekday::Sun);
        assert_eq!(p.required(6, 0), 4);
        assert_eq!(p.total_required(), 2 * 6 + 4 + 7);
    }

    #[test]
    fn test_eligibility_and_leave() {
        let p = RosterProblem::new(&config()).unwrap();
        assert_eq!(p.eligible_mask(0), 0b11);
        assert_eq!(p.eligible_mask(1), 0b10);
        assert!(!p.is_eligible(1, 0));
        assert!(p.is_on_leave(1, 2));
        assert!(!p.is_on_leave(0, 2));
    }

    #[test]
    fn test_preference_is_capped() {
        let p = RosterProblem::new(&config()).unwrap();
        assert!((p.preference(1, 0, 1) - 0.7).abs() < 1e-12);
        assert!((p.preference(1, 4, 1) - 1.0).abs() < 1e-12);
        assert!(p.has_preferences(1));
        assert!(!p.has_preferences(0));
    }

    #[test]
    fn test_short_horizon_rest() {
        let cfg = config()
            .with_period_days(3)
            .with_staffing(vec![])
            .with_constraints(LaborConstraints::default().with_min_rest_days_per_week(2));
        let p = RosterProblem::new(&cfg).unwrap();
        assert_eq!(p.rest_window(), 3);
        assert_eq!(p.required_rest(), 0);
    }

    #[test]
    fn test_random_work_gene_respects_eligibility() {
        let p = RosterProblem::new(&config()).unwrap();
        let mut rng = create_rng(3);
        for _ in 0..50 {
            assert_eq!(p.random_work_gene(1, &mut rng), Gene::single(1));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(RosterProblem::new(&OptimizationConfig::default()).is_err());
    }
}
