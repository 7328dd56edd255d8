//! Optimization request configuration.
//!
//! [`OptimizationConfig`] is built once per request, validated with
//! [`validate`](OptimizationConfig::validate), and then shared read-only by
//! every engine for the duration of a run.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};

use super::{Employee, Shift};
use crate::error::{ConfigError, ConfigViolation};
use crate::ga::GaConfig;
use crate::hybrid::HybridConfig;
use crate::sa::SaConfig;

/// Maximum number of shifts in a catalog.
///
/// Genes store the assigned shifts of one employee-day as a 64-bit set.
pub const MAX_SHIFTS: usize = 64;

/// Relative importance of the four objectives.
///
/// Weights are non-negative and normalized by their sum at evaluation time,
/// so `(1, 1, 1, 1)` and `(0.25, 0.25, 0.25, 0.25)` are equivalent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectiveWeights {
    /// Even distribution of work-days across employees.
    pub fairness: f64,
    /// Low labor cost relative to the minimal staffing cost.
    pub cost: f64,
    /// Cells staffed exactly at requirement.
    pub efficiency: f64,
    /// Employee preference hits.
    pub satisfaction: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            fairness: 0.3,
            cost: 0.2,
            efficiency: 0.3,
            satisfaction: 0.2,
        }
    }
}

impl ObjectiveWeights {
    pub fn new(fairness: f64, cost: f64, efficiency: f64, satisfaction: f64) -> Self {
        Self {
            fairness,
            cost,
            efficiency,
            satisfaction,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.fairness + self.cost + self.efficiency + self.satisfaction
    }

    /// Weights scaled to sum to 1, in `[fairness, cost, efficiency, satisfaction]` order.
    ///
    /// Falls back to equal weights when the sum is not positive.
    pub fn normalized(&self) -> [f64; 4] {
        let total = self.total();
        if total > 0.0 && total.is_finite() {
            [
                self.fairness / total,
                self.cost / total,
                self.efficiency / total,
                self.satisfaction / total,
            ]
        } else {
            [0.25; 4]
        }
    }

    fn validate(&self, violations: &mut Vec<ConfigViolation>) {
        for (name, value) in [
            ("weights.fairness", self.fairness),
            ("weights.cost", self.cost),
            ("weights.efficiency", self.efficiency),
            ("weights.satisfaction", self.satisfaction),
        ] {
            if !value.is_finite() || value < 0.0 {
                violations.push(ConfigViolation::new(
                    name,
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        if self.total() <= 0.0 {
            violations.push(ConfigViolation::new(
                "weights",
                "at least one objective weight must be positive",
            ));
        }
    }
}

/// Hard labor-policy limits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaborConstraints {
    /// Longest allowed run of consecutive work-days.
    pub max_consecutive_work_days: u32,
    /// Minimum days off in every rolling 7-day window.
    pub min_rest_days_per_week: u32,
    /// Optional cap on hours worked in any rolling 7-day window.
    pub max_weekly_hours: Option<f64>,
}

impl Default for LaborConstraints {
    fn default() -> Self {
        Self {
            max_consecutive_work_days: 6,
            min_rest_days_per_week: 1,
            max_weekly_hours: None,
        }
    }
}

impl LaborConstraints {
    pub fn with_max_consecutive_work_days(mut self, days: u32) -> Self {
        self.max_consecutive_work_days = days;
        self
    }

    pub fn with_min_rest_days_per_week(mut self, days: u32) -> Self {
        self.min_rest_days_per_week = days;
        self
    }

    pub fn with_max_weekly_hours(mut self, hours: f64) -> Self {
        self.max_weekly_hours = Some(hours);
        self
    }

    fn validate(&self, violations: &mut Vec<ConfigViolation>) {
        if self.max_consecutive_work_days == 0 {
            violations.push(ConfigViolation::new(
                "constraints.max_consecutive_work_days",
                "must be at least 1",
            ));
        }
        if self.min_rest_days_per_week > 7 {
            violations.push(ConfigViolation::new(
                "constraints.min_rest_days_per_week",
                format!("cannot exceed 7, got {}", self.min_rest_days_per_week),
            ));
        }
        if let Some(hours) = self.max_weekly_hours {
            if !hours.is_finite() || hours <= 0.0 {
                violations.push(ConfigViolation::new(
                    "constraints.max_weekly_hours",
                    format!("must be positive, got {hours}"),
                ));
            }
        }
    }
}

/// Labor cost parameters, in hour units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    /// Hours per calendar week paid at the normal rate.
    pub standard_weekly_hours: f64,
    /// Rate multiplier for hours above the standard.
    pub overtime_multiplier: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            standard_weekly_hours: 40.0,
            overtime_multiplier: 1.5,
        }
    }
}

impl CostModel {
    fn validate(&self, violations: &mut Vec<ConfigViolation>) {
        if !self.standard_weekly_hours.is_finite() || self.standard_weekly_hours <= 0.0 {
            violations.push(ConfigViolation::new(
                "cost.standard_weekly_hours",
                "must be positive",
            ));
        }
        if !self.overtime_multiplier.is_finite() || self.overtime_multiplier < 1.0 {
            violations.push(ConfigViolation::new(
                "cost.overtime_multiplier",
                "must be at least 1.0",
            ));
        }
    }
}

/// Headcount override for a single (day, shift) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StaffingRequirement {
    /// Shift the requirement applies to.
    pub shift_id: String,
    /// Day index within the horizon (0-based).
    pub day: usize,
    /// Required headcount.
    pub headcount: u32,
}

impl StaffingRequirement {
    pub fn new(shift_id: impl Into<String>, day: usize, headcount: u32) -> Self {
        Self {
            shift_id: shift_id.into(),
            day,
            headcount,
        }
    }
}

/// A complete optimization request.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_roster::models::{Employee, OptimizationConfig, Shift};
///
/// let day = Shift::new(
///     "day",
///     "Day",
///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
///     2,
/// );
/// let config = OptimizationConfig::default()
///     .with_period_days(7)
///     .with_shifts(vec![day])
///     .with_employees((0..5).map(|i| Employee::new(format!("e{i}"))).collect());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.problem_size(), 35);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationConfig {
    /// Calendar date of day 0.
    pub start_date: NaiveDate,
    /// Horizon length in contiguous days.
    pub period_days: usize,
    /// Employee roster, in chromosome row order.
    pub employees: Vec<Employee>,
    /// Shift catalog.
    pub shifts: Vec<Shift>,
    /// Per-cell headcount overrides.
    #[cfg_attr(feature = "serde", serde(default))]
    pub staffing: Vec<StaffingRequirement>,
    /// Hard labor-policy limits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: LaborConstraints,
    /// Objective weights.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weights: ObjectiveWeights,
    /// Cost parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: CostModel,
    /// Genetic algorithm parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ga: GaConfig,
    /// Simulated annealing parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub sa: SaConfig,
    /// Hybrid engine parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hybrid: HybridConfig,
    /// Random seed. `None` draws a fresh seed per run.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u64>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::default(),
            period_days: 7,
            employees: Vec::new(),
            shifts: Vec::new(),
            staffing: Vec::new(),
            constraints: LaborConstraints::default(),
            weights: ObjectiveWeights::default(),
            cost: CostModel::default(),
            ga: GaConfig::default(),
            sa: SaConfig::default(),
            hybrid: HybridConfig::default(),
            seed: None,
        }
    }
}

impl OptimizationConfig {
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = date;
        self
    }

    pub fn with_period_days(mut self, days: usize) -> Self {
        self.period_days = days;
        self
    }

    pub fn with_employees(mut self, employees: Vec<Employee>) -> Self {
        self.employees = employees;
        self
    }

    pub fn with_shifts(mut self, shifts: Vec<Shift>) -> Self {
        self.shifts = shifts;
        self
    }

    pub fn with_staffing(mut self, staffing: Vec<StaffingRequirement>) -> Self {
        self.staffing = staffing;
        self
    }

    pub fn with_constraints(mut self, constraints: LaborConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_cost_model(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_ga(mut self, ga: GaConfig) -> Self {
        self.ga = ga;
        self
    }

    pub fn with_sa(mut self, sa: SaConfig) -> Self {
        self.sa = sa;
        self
    }

    pub fn with_hybrid(mut self, hybrid: HybridConfig) -> Self {
        self.hybrid = hybrid;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of employees on the roster.
    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    /// Number of genes in a chromosome: employees × days.
    pub fn problem_size(&self) -> usize {
        self.employees.len() * self.period_days
    }

    /// Checks every invariant and reports all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut violations = Vec::new();

        if self.employees.is_empty() {
            violations.push(ConfigViolation::new("employees", "must not be empty"));
        }
        if self.period_days == 0 {
            violations.push(ConfigViolation::new("period_days", "must be positive"));
        } else if self
            .start_date
            .checked_add_days(Days::new(self.period_days as u64))
            .is_none()
        {
            violations.push(ConfigViolation::new(
                "period_days",
                "horizon runs past the last representable date",
            ));
        }
        if self.shifts.is_empty() {
            violations.push(ConfigViolation::new("shifts", "catalog must not be empty"));
        }
        if self.shifts.len() > MAX_SHIFTS {
            violations.push(ConfigViolation::new(
                "shifts",
                format!(
                    "catalog holds {} shifts, at most {MAX_SHIFTS} are supported",
                    self.shifts.len()
                ),
            ));
        }

        let mut shift_ids = HashSet::new();
        for (i, shift) in self.shifts.iter().enumerate() {
            if !shift_ids.insert(shift.id.as_str()) {
                violations.push(ConfigViolation::new(
                    format!("shifts[{i}].id"),
                    format!("duplicate shift id '{}'", shift.id),
                ));
            }
            if shift.start == shift.end {
                violations.push(ConfigViolation::new(
                    format!("shifts[{i}]"),
                    format!("shift '{}' has zero length", shift.id),
                ));
            }
        }

        let mut employee_ids = HashSet::new();
        for (i, employee) in self.employees.iter().enumerate() {
            if !employee_ids.insert(employee.id.as_str()) {
                violations.push(ConfigViolation::new(
                    format!("employees[{i}].id"),
                    format!("duplicate employee id '{}'", employee.id),
                ));
            }
            if let Some(eligible) = &employee.eligible_shifts {
                let mut unknown: Vec<&str> = eligible
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !shift_ids.contains(id))
                    .collect();
                unknown.sort_unstable();
                for id in unknown {
                    violations.push(ConfigViolation::new(
                        format!("employees[{i}].eligible_shifts"),
                        format!("unknown shift '{id}'"),
                    ));
                }
            }
            let mut preferred: Vec<(&String, &f64)> = employee.preferences.shifts.iter().collect();
            preferred.sort_by(|a, b| a.0.cmp(b.0));
            for (id, weight) in preferred {
                if !shift_ids.contains(id.as_str()) {
                    violations.push(ConfigViolation::new(
                        format!("employees[{i}].preferences"),
                        format!("unknown shift '{id}'"),
                    ));
                }
                if !weight.is_finite() || *weight < 0.0 {
                    violations.push(ConfigViolation::new(
                        format!("employees[{i}].preferences"),
                        format!("weight for shift '{id}' must be non-negative, got {weight}"),
                    ));
                }
            }
            if employee
                .preferences
                .weekdays
                .values()
                .any(|w| !w.is_finite() || *w < 0.0)
            {
                violations.push(ConfigViolation::new(
                    format!("employees[{i}].preferences"),
                    "weekday weights must be non-negative",
                ));
            }
        }

        for (i, req) in self.staffing.iter().enumerate() {
            if !shift_ids.contains(req.shift_id.as_str()) {
                violations.push(ConfigViolation::new(
                    format!("staffing[{i}].shift_id"),
                    format!("unknown shift '{}'", req.shift_id),
                ));
            }
            if req.day >= self.period_days {
                violations.push(ConfigViolation::new(
                    format!("staffing[{i}].day"),
                    format!(
                        "day {} is outside the {}-day horizon",
                        req.day, self.period_days
                    ),
                ));
            }
        }

        self.constraints.validate(&mut violations);
        self.weights.validate(&mut violations);
        self.cost.validate(&mut violations);
        violations.extend(self.ga.validate());
        violations.extend(self.sa.validate());
        violations.extend(self.hybrid.validate());

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { violations })
        }
    }
}
