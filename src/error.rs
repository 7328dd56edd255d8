//! Error types for roster optimization.
//!
//! Infeasible schedules, cancellation and timeouts are *not* errors: they are
//! reported through [`OptimizationResult`](crate::optimizer::OptimizationResult).
//! Errors are raised only for requests that cannot be run at all.

use std::fmt;

use thiserror::Error;

/// One violated configuration invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigViolation {
    /// Dotted path of the offending field (e.g. `"staffing[3].shift_id"`).
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ConfigViolation {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// An [`OptimizationConfig`](crate::models::OptimizationConfig) failed validation.
///
/// Carries every violated invariant, not just the first one found.
///
/// # Example
///
/// ```
/// use u_roster::models::OptimizationConfig;
///
/// let config = OptimizationConfig::default().with_period_days(0);
/// let err = config.validate().unwrap_err();
/// assert!(err.violations.iter().any(|v| v.field == "employees"));
/// assert!(err.violations.iter().any(|v| v.field == "period_days"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid optimization config ({} violation(s)): {}", .violations.len(), join_violations(.violations))]
pub struct ConfigError {
    /// All violated invariants, in detection order.
    pub violations: Vec<ConfigViolation>,
}

impl ConfigError {
    /// Returns `true` if a violation was reported for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The main error type for the optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The configuration violates one or more invariants.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An algorithm name was not recognised by the factory.
    #[error("unsupported algorithm: {name}")]
    UnsupportedAlgorithm {
        /// The name that was requested.
        name: String,
    },

    /// The operation exists in the interface but has no implementation.
    #[error("operation not supported: {operation}")]
    UnsupportedOperation {
        /// The operation that was requested.
        operation: String,
    },

    /// A chromosome was built for different roster dimensions.
    #[error("chromosome dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// `(employees, days)` of the problem.
        expected: (usize, usize),
        /// `(employees, days)` of the chromosome.
        actual: (usize, usize),
    },
}

/// A type alias for results that return [`OptimizeError`].
pub type OptimizeResult<T> = Result<T, OptimizeError>;
