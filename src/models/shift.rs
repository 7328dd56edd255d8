//! Shift catalog entries.

use std::collections::HashMap;

use chrono::{NaiveTime, Timelike, Weekday};

/// A shift that employees can be assigned to.
///
/// The required headcount defaults to [`headcount`](Self::headcount) on every
/// day; individual weekdays may override it. A shift whose end time is not
/// after its start time runs overnight into the next calendar day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    /// Unique shift identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Start time of day.
    pub start: NaiveTime,
    /// End time of day.
    pub end: NaiveTime,
    /// Required headcount on days without a weekday override.
    pub headcount: u32,
    /// Weekday-specific headcount overrides.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weekday_headcount: HashMap<Weekday, u32>,
}

impl Shift {
    /// Creates a shift with a uniform daily headcount.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        headcount: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            headcount,
            weekday_headcount: HashMap::new(),
        }
    }

    /// Overrides the headcount on one weekday.
    pub fn with_weekday_headcount(mut self, weekday: Weekday, headcount: u32) -> Self {
        self.weekday_headcount.insert(weekday, headcount);
        self
    }

    /// Required headcount on the given weekday.
    pub fn headcount_on(&self, weekday: Weekday) -> u32 {
        self.weekday_headcount
            .get(&weekday)
            .copied()
            .unwrap_or(self.headcount)
    }

    /// Returns `true` if the shift crosses midnight.
    pub fn is_overnight(&self) -> bool {
        self.end <= self.start
    }

    /// Shift length in hours, accounting for overnight shifts.
    ///
    /// A shift with identical start and end is treated as a full 24 hours;
    /// config validation rejects such shifts.
    pub fn duration_hours(&self) -> f64 {
        let start = self.start.num_seconds_from_midnight() as i64;
        let end = self.end.num_seconds_from_midnight() as i64;
        let seconds = if end > start {
            end - start
        } else {
            end + 86_400 - start
        };
        seconds as f64 / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_day_shift_duration() {
        let shift = Shift::new("d", "Day", time(9, 0), time(17, 30), 2);
        assert!(!shift.is_overnight());
        assert!((shift.duration_hours() - 8.5).abs() < 1e-10);
    }

    #[test]
    fn test_overnight_shift_duration() {
        let shift = Shift::new("n", "Night", time(22, 0), time(6, 0), 1);
        assert!(shift.is_overnight());
        assert!((shift.duration_hours() - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_weekday_override() {
        let shift = Shift::new("d", "Day", time(8, 0), time(16, 0), 3)
            .with_weekday_headcount(Weekday::Sun, 1);
        assert_eq!(shift.headcount_on(Weekday::Mon), 3);
        assert_eq!(shift.headcount_on(Weekday::Sun), 1);
    }
}
