//! Conflict classification types.

use std::cmp::Ordering;
use std::fmt;

/// Conflict severity, from low (1) to severe (4).
///
/// Severity 3 and above marks a hard-constraint violation: a schedule with
/// any such conflict is infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Low = 1,
    Moderate = 2,
    High = 3,
    Severe = 4,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Severe,
    ];

    /// Numeric level, 1 through 4.
    pub fn level(self) -> u32 {
        self as u32
    }

    /// Returns `true` for hard-constraint severities (3 and 4).
    pub fn is_hard(self) -> bool {
        self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Which detector category a conflict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictType {
    /// Per-employee rules: double booking, leave, labor limits.
    Employee,
    /// Shift eligibility.
    Shift,
    /// Per-(day, shift) staffing levels.
    Date,
}

impl ConflictType {
    pub const ALL: [ConflictType; 3] = [
        ConflictType::Employee,
        ConflictType::Shift,
        ConflictType::Date,
    ];
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConflictType::Employee => "EMPLOYEE",
            ConflictType::Shift => "SHIFT",
            ConflictType::Date => "DATE",
        })
    }
}

/// The specific rule a conflict violates.
///
/// Variants are declared in priority order: legal constraints first, then
/// staffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    DoubleBooking,
    OnLeave,
    IneligibleShift,
    ConsecutiveWorkExceeded,
    InsufficientRest,
    WeeklyHoursExceeded,
    Understaffed,
    Overstaffed,
}

impl ConflictKind {
    /// Number of kinds.
    pub const COUNT: usize = 8;

    pub const ALL: [ConflictKind; Self::COUNT] = [
        ConflictKind::DoubleBooking,
        ConflictKind::OnLeave,
        ConflictKind::IneligibleShift,
        ConflictKind::ConsecutiveWorkExceeded,
        ConflictKind::InsufficientRest,
        ConflictKind::WeeklyHoursExceeded,
        ConflictKind::Understaffed,
        ConflictKind::Overstaffed,
    ];

    pub fn conflict_type(self) -> ConflictType {
        match self {
            ConflictKind::DoubleBooking
            | ConflictKind::OnLeave
            | ConflictKind::ConsecutiveWorkExceeded
            | ConflictKind::InsufficientRest
            | ConflictKind::WeeklyHoursExceeded => ConflictType::Employee,
            ConflictKind::IneligibleShift => ConflictType::Shift,
            ConflictKind::Understaffed | ConflictKind::Overstaffed => ConflictType::Date,
        }
    }

    /// Tie-break rank among equal severities; lower ranks sort first.
    pub fn priority(self) -> usize {
        self as usize
    }
}

/// One detected rule violation.
///
/// Identity is structural: two detections of the same violation compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleConflict {
    pub conflict_type: ConflictType,
    pub kind: ConflictKind,
    pub severity: Severity,
    /// Human-readable description.
    pub description: String,
    /// Offending employee row, if the conflict concerns one employee.
    pub employee_index: Option<usize>,
    pub employee_id: Option<String>,
    /// Day index the conflict is anchored on.
    pub day: usize,
    /// Offending shift index, if the conflict concerns one shift.
    pub shift_index: Option<usize>,
    pub shift_id: Option<String>,
}

impl ScheduleConflict {
    pub fn is_hard(&self) -> bool {
        self.severity.is_hard()
    }

    /// Canonical report order: severity descending, then kind priority,
    /// employee, day, shift.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.kind.priority().cmp(&other.kind.priority()))
            .then_with(|| self.employee_index.cmp(&other.employee_index))
            .then_with(|| self.day.cmp(&other.day))
            .then_with(|| self.shift_index.cmp(&other.shift_index))
    }
}

impl fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} sev {}] {}",
            self.conflict_type, self.severity, self.description
        )
    }
}

/// Per-kind violation counts without materialized conflicts.
///
/// Produced on the evaluation hot path, where descriptions are never read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictTally {
    counts: [usize; ConflictKind::COUNT],
    hard: usize,
    soft: usize,
    hard_severity: u32,
    soft_severity: u32,
}

impl ConflictTally {
    pub(crate) fn record(&mut self, kind: ConflictKind, severity: Severity) {
        self.counts[kind as usize] += 1;
        if severity.is_hard() {
            self.hard += 1;
            self.hard_severity += severity.level();
        } else {
            self.soft += 1;
            self.soft_severity += severity.level();
        }
    }

    /// Builds a tally from materialized conflicts.
    pub fn from_conflicts(conflicts: &[ScheduleConflict]) -> Self {
        let mut tally = Self::default();
        for c in conflicts {
            tally.record(c.kind, c.severity);
        }
        tally
    }

    pub fn count(&self, kind: ConflictKind) -> usize {
        self.counts[kind as usize]
    }

    /// Number of conflicts with severity 3 or above.
    pub fn hard(&self) -> usize {
        self.hard
    }

    pub fn soft(&self) -> usize {
        self.soft
    }

    pub fn total(&self) -> usize {
        self.hard + self.soft
    }

    /// Σ severity over hard conflicts.
    pub fn hard_severity(&self) -> u32 {
        self.hard_severity
    }

    /// Σ severity over soft conflicts.
    pub fn soft_severity(&self) -> u32 {
        self.soft_severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(kind: ConflictKind, severity: Severity, employee: Option<usize>, day: usize) -> ScheduleConflict {
        ScheduleConflict {
            conflict_type: kind.conflict_type(),
            kind,
            severity,
            description: String::new(),
            employee_index: employee,
            employee_id: None,
            day,
            shift_index: None,
            shift_id: None,
        }
    }

    #[test]
    fn test_hard_threshold() {
        assert!(!Severity::Low.is_hard());
        assert!(!Severity::Moderate.is_hard());
        assert!(Severity::High.is_hard());
        assert!(Severity::Severe.is_hard());
        assert_eq!(Severity::Severe.level(), 4);
    }

    #[test]
    fn test_kind_categories() {
        assert_eq!(ConflictKind::DoubleBooking.conflict_type(), ConflictType::Employee);
        assert_eq!(ConflictKind::IneligibleShift.conflict_type(), ConflictType::Shift);
        assert_eq!(ConflictKind::Overstaffed.conflict_type(), ConflictType::Date);
    }

    #[test]
    fn test_report_order() {
        let mut list = vec![
            conflict(ConflictKind::Overstaffed, Severity::Low, None, 0),
            conflict(ConflictKind::Understaffed, Severity::High, None, 1),
            conflict(ConflictKind::InsufficientRest, Severity::High, Some(2), 0),
            conflict(ConflictKind::OnLeave, Severity::Severe, Some(0), 3),
        ];
        list.sort_by(ScheduleConflict::report_order);
        let kinds: Vec<_> = list.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConflictKind::OnLeave,
                ConflictKind::InsufficientRest,
                ConflictKind::Understaffed,
                ConflictKind::Overstaffed,
            ]
        );
    }

    #[test]
    fn test_tally() {
        let list = vec![
            conflict(ConflictKind::Overstaffed, Severity::Moderate, None, 0),
            conflict(ConflictKind::Understaffed, Severity::High, None, 1),
            conflict(ConflictKind::OnLeave, Severity::Severe, Some(0), 3),
        ];
        let t = ConflictTally::from_conflicts(&list);
        assert_eq!(t.total(), 3);
        assert_eq!(t.hard(), 2);
        assert_eq!(t.hard_severity(), 7);
        assert_eq!(t.soft_severity(), 2);
        assert_eq!(t.count(ConflictKind::OnLeave), 1);
    }
}
