//! Employee roster entries.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, Weekday};

/// Preference weights stated by an employee.
///
/// Weights are non-negative; an assignment matching both a preferred shift
/// and a preferred weekday scores the sum of both weights, capped at 1.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Preferences {
    /// Shift id → weight.
    #[cfg_attr(feature = "serde", serde(default))]
    pub shifts: HashMap<String, f64>,
    /// Weekday → weight.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weekdays: HashMap<Weekday, f64>,
}

impl Preferences {
    /// Returns `true` if no preference has been stated.
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty() && self.weekdays.is_empty()
    }
}

/// An employee available for rostering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Employee {
    /// Unique employee identifier.
    pub id: String,
    /// Display name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Shifts this employee may work. `None` means every shift in the catalog.
    #[cfg_attr(feature = "serde", serde(default))]
    pub eligible_shifts: Option<HashSet<String>>,
    /// Dates the employee is on leave and must not be assigned.
    ///
    /// Dates outside the planning horizon are ignored.
    #[cfg_attr(feature = "serde", serde(default))]
    pub leave_dates: BTreeSet<NaiveDate>,
    /// Stated preferences.
    #[cfg_attr(feature = "serde", serde(default))]
    pub preferences: Preferences,
}

impl Employee {
    /// Creates an employee with no restrictions and no preferences.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            eligible_shifts: None,
            leave_dates: BTreeSet::new(),
            preferences: Preferences::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restricts the employee to the given shifts.
    pub fn with_eligible_shifts<I, S>(mut self, shifts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.eligible_shifts = Some(shifts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_leave_date(mut self, date: NaiveDate) -> Self {
        self.leave_dates.insert(date);
        self
    }

    pub fn with_shift_preference(mut self, shift_id: impl Into<String>, weight: f64) -> Self {
        self.preferences.shifts.insert(shift_id.into(), weight);
        self
    }

    pub fn with_weekday_preference(mut self, weekday: Weekday, weight: f64) -> Self {
        self.preferences.weekdays.insert(weekday, weight);
        self
    }

    /// Returns `true` if the employee may work `shift_id`.
    pub fn can_work(&self, shift_id: &str) -> bool {
        self.eligible_shifts
            .as_ref()
            .is_none_or(|set| set.contains(shift_id))
    }

    /// Returns `true` if the employee is on leave on `date`.
    pub fn is_on_leave(&self, date: NaiveDate) -> bool {
        self.leave_dates.contains(&date)
    }
}
