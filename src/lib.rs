//! Workforce shift-roster optimization.
//!
//! Searches for an assignment of employees to shifts over a planning
//! horizon that satisfies labor rules and staffing requirements while
//! maximizing a weighted multi-objective score:
//!
//! - **Chromosome**: flat employee × day gene matrix with genetic operators
//!   and a greedy constructor.
//! - **Conflict detection**: typed, severity-ranked violations of
//!   employee, shift and date rules. Severity 3 and above is infeasible.
//! - **Fitness**: fairness, cost, efficiency and satisfaction scores combined
//!   with a penalty that always ranks feasible schedules first.
//! - **Genetic Algorithm (GA)**: parallel population search with tournament,
//!   roulette or rank selection and elitism.
//! - **Simulated Annealing (SA)**: single-trajectory search with geometric,
//!   linear or Lundy-Mees cooling.
//! - **Hybrid**: GA exploration followed by SA refinement of the elites.
//! - **Optimizer**: validation, size-based algorithm selection and the
//!   standardized [`OptimizationResult`](optimizer::OptimizationResult).
//!
//! # Example
//!
//! ```
//! use chrono::NaiveTime;
//! use u_roster::models::{Employee, LaborConstraints, OptimizationConfig, Shift};
//! use u_roster::optimizer::{AlgorithmType, OptimizationFactory};
//! use u_roster::sa::SaConfig;
//!
//! let config = OptimizationConfig::default()
//!     .with_period_days(7)
//!     .with_shifts(vec![Shift::new(
//!         "day",
//!         "Day",
//!         NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!         NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
//!         1,
//!     )])
//!     .with_employees(vec![Employee::new("ana"), Employee::new("ben"), Employee::new("cy")])
//!     .with_constraints(LaborConstraints::default().with_max_consecutive_work_days(5))
//!     .with_sa(SaConfig::default().with_max_iterations(3_000))
//!     .with_seed(7);
//!
//! let factory = OptimizationFactory::default();
//! assert_eq!(factory.recommend(&config), AlgorithmType::SimulatedAnnealing);
//!
//! let result = factory.optimize(&config).unwrap();
//! assert!(result.is_feasible());
//! assert_eq!(result.assignments.len(), 7);
//! ```
//!
//! # Architecture
//!
//! A validated [`OptimizationConfig`](models::OptimizationConfig) is compiled
//! into a read-only [`RosterProblem`](models::RosterProblem) shared by every
//! engine. Engines take an explicit seed and an optional cancellation flag;
//! the same seed always reproduces the same result. The crate emits
//! `tracing` events but never installs a subscriber.

pub mod chromosome;
pub mod conflict;
pub mod error;
pub mod fitness;
pub mod ga;
pub mod hybrid;
pub mod models;
pub mod optimizer;
pub mod random;
pub mod sa;

mod run;

pub use run::TerminationReason;
