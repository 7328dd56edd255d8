//! Conflict distributions and structured reports.

use std::collections::BTreeMap;

use super::types::{ConflictType, ScheduleConflict, Severity};

/// Structured digest of a conflict list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictReport {
    pub total: usize,
    /// Count per severity; every severity is present.
    pub severity_distribution: BTreeMap<Severity, usize>,
    /// Count per category; every category is present.
    pub type_distribution: BTreeMap<ConflictType, usize>,
    /// Number of hard conflicts (severity 3 or above).
    pub needs_resolution: usize,
    pub summary: String,
}

/// Counts conflicts per severity. Values sum to `conflicts.len()`.
pub fn severity_distribution(conflicts: &[ScheduleConflict]) -> BTreeMap<Severity, usize> {
    let mut dist: BTreeMap<Severity, usize> = Severity::ALL.iter().map(|&s| (s, 0)).collect();
    for c in conflicts {
        *dist.entry(c.severity).or_default() += 1;
    }
    dist
}

/// Counts conflicts per category. Values sum to `conflicts.len()`.
pub fn type_distribution(conflicts: &[ScheduleConflict]) -> BTreeMap<ConflictType, usize> {
    let mut dist: BTreeMap<ConflictType, usize> =
        ConflictType::ALL.iter().map(|&t| (t, 0)).collect();
    for c in conflicts {
        *dist.entry(c.conflict_type).or_default() += 1;
    }
    dist
}

/// One-line textual digest.
///
/// ```
/// use u_roster::conflict::generate_conflict_summary;
///
/// assert_eq!(generate_conflict_summary(&[]), "no conflicts");
/// ```
pub fn generate_conflict_summary(conflicts: &[ScheduleConflict]) -> String {
    if conflicts.is_empty() {
        return "no conflicts".to_string();
    }
    let hard = conflicts.iter().filter(|c| c.is_hard()).count();
    let types = type_distribution(conflicts)
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(t, n)| format!("{t} {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let severities = severity_distribution(conflicts)
        .into_iter()
        .rev()
        .filter(|(_, n)| *n > 0)
        .map(|(s, n)| format!("sev{s} {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} conflict(s), {hard} hard: {types}; {severities}",
        conflicts.len()
    )
}

pub fn generate_conflict_report(conflicts: &[ScheduleConflict]) -> ConflictReport {
    ConflictReport {
        total: conflicts.len(),
        severity_distribution: severity_distribution(conflicts),
        type_distribution: type_distribution(conflicts),
        needs_resolution: conflicts.iter().filter(|c| c.is_hard()).count(),
        summary: generate_conflict_summary(conflicts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictKind;

    fn conflict(kind: ConflictKind, severity: Severity) -> ScheduleConflict {
        ScheduleConflict {
            conflict_type: kind.conflict_type(),
            kind,
            severity,
            description: String::new(),
            employee_index: None,
            employee_id: None,
            day: 0,
            shift_index: None,
            shift_id: None,
        }
    }

    #[test]
    fn test_distributions_include_zero_keys() {
        let dist = severity_distribution(&[]);
        assert_eq!(dist.len(), 4);
        assert!(dist.values().all(|&n| n == 0));
        assert_eq!(type_distribution(&[]).len(), 3);
    }

    #[test]
    fn test_report() {
        let list = vec![
            conflict(ConflictKind::DoubleBooking, Severity::Severe),
            conflict(ConflictKind::Understaffed, Severity::High),
            conflict(ConflictKind::Overstaffed, Severity::Low),
        ];
        let report = generate_conflict_report(&list);
        assert_eq!(report.total, 3);
        assert_eq!(report.needs_resolution, 2);
        assert_eq!(report.severity_distribution.values().sum::<usize>(), 3);
        assert_eq!(report.type_distribution[&ConflictType::Date], 2);
        assert_eq!(report.type_distribution[&ConflictType::Shift], 0);
        assert_eq!(
            report.summary,
            "3 conflict(s), 2 hard: EMPLOYEE 1, DATE 2; sev4 1, sev3 1, sev1 1"
        );
    }
}
