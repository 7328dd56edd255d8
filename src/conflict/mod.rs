//! Constraint and conflict detection.
//!
//! [`ConflictDetector`] checks a [`Chromosome`](crate::chromosome::Chromosome)
//! against three categories of rules:
//!
//! - **Employee**: double booking, work on leave days, consecutive-day limit,
//!   rolling rest window, optional weekly hour cap
//! - **Shift**: eligibility
//! - **Date**: per-(day, shift) under- and overstaffing
//!
//! The category detectors return exactly the conflicts of that category that
//! the full scan returns. Severity is fixed per kind; any conflict of
//! severity 3 or above makes a schedule infeasible.

mod detector;
mod report;
mod types;

pub use detector::{detect_conflicts, detect_conflicts_for_employee, ConflictDetector};
pub use report::{
    generate_conflict_report, generate_conflict_summary, severity_distribution,
    type_distribution, ConflictReport,
};
pub use types::{ConflictKind, ConflictTally, ConflictType, ScheduleConflict, Severity};
