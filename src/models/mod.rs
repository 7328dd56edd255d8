//! Domain model: employees, shifts, and the optimization request.
//!
//! - [`Employee`], [`Shift`]: roster and catalog entries
//! - [`OptimizationConfig`]: a complete, validatable request
//! - [`RosterProblem`]: the compiled index-based form engines run against

mod config;
mod employee;
mod problem;
mod shift;

pub use config::{
    CostModel, LaborConstraints, ObjectiveWeights, OptimizationConfig, StaffingRequirement,
    MAX_SHIFTS,
};
pub use employee::{Employee, Preferences};
pub use problem::RosterProblem;
pub use shift::Shift;
