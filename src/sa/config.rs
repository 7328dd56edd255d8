//! SA configuration and cooling schedules.
//!
//! Temperatures are measured in fitness units. A single hard violation costs
//! about 0.7 fitness on a small roster, so a start temperature of 1.0 still
//! lets the walk cross infeasible rosters while it is hot.

use crate::error::ConfigViolation;

/// How the temperature falls between steps.
///
/// Lundy & Mees (1986) describe the third form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoolingSchedule {
    /// `T ← alpha · T`, with `alpha` in (0, 1).
    Geometric { alpha: f64 },

    /// Equal decrements from the start temperature down to the floor, spread
    /// over `max_iterations / iterations_per_temperature` steps (1000 steps
    /// without an iteration budget).
    Linear,

    /// `T ← T / (1 + beta · T)`, one neighbor per step.
    LundyMees { beta: f64 },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.95 }
    }
}

/// Settings of the roster annealer.
///
/// ```
/// use u_roster::sa::{CoolingSchedule, SaConfig};
///
/// // 8 employees over two weeks.
/// let config = SaConfig::for_roster(8, 14).with_cooling_rate(0.98);
/// assert_eq!(config.cooling, CoolingSchedule::Geometric { alpha: 0.98 });
/// assert_eq!(config.max_iterations, 8 * 14 * 40);
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SaConfig {
    /// Start temperature.
    pub initial_temperature: f64,

    /// The walk ends once the temperature is no longer above this floor.
    pub min_temperature: f64,

    pub cooling: CoolingSchedule,

    /// Neighbors tried per temperature step; ignored by `LundyMees`.
    pub iterations_per_temperature: usize,

    /// Neighbor budget over the whole walk. 0 leaves only the cooling
    /// schedule as the limit.
    pub max_iterations: usize,

    /// Day cells reassigned to build one neighbor.
    pub perturbation_size: usize,

    /// Temperature steps without a better roster before the walk counts as
    /// converged. 0 disables the check.
    pub stagnation_limit: usize,

    /// Wall-clock limit, polled before each temperature step.
    pub time_limit_ms: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1.0,
            min_temperature: 1e-4,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 100,
            max_iterations: 0,
            perturbation_size: 2,
            stagnation_limit: 0,
            time_limit_ms: None,
        }
    }
}

impl SaConfig {
    /// Budget of 40 neighbors per (employee, day) cell. Rosters above 500
    /// cells move one extra cell per neighbor for every further 500, up to 4.
    pub fn for_roster(employees: usize, days: usize) -> Self {
        let cells = employees * days;
        Self {
            max_iterations: (cells * 40).max(1),
            perturbation_size: (1 + cells.div_ceil(500)).min(4),
            ..Self::default()
        }
    }

    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    /// Shorthand for geometric cooling.
    pub fn with_cooling_rate(self, alpha: f64) -> Self {
        self.with_cooling(CoolingSchedule::Geometric { alpha })
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_perturbation_size(mut self, cells: usize) -> Self {
        self.perturbation_size = cells;
        self
    }

    pub fn with_stagnation_limit(mut self, steps: usize) -> Self {
        self.stagnation_limit = steps;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Every violated setting, with `sa.`-prefixed field paths.
    pub fn validate(&self) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        let mut require = |ok: bool, field: &str, message: String| {
            if !ok {
                violations.push(ConfigViolation::new(field, message));
            }
        };

        let positive = |t: f64| t.is_finite() && t > 0.0;
        let (t0, t_min) = (self.initial_temperature, self.min_temperature);
        require(
            positive(t0),
            "sa.initial_temperature",
            format!("must be a positive temperature, got {t0}"),
        );
        require(
            positive(t_min),
            "sa.min_temperature",
            format!("must be a positive temperature, got {t_min}"),
        );
        if positive(t0) && positive(t_min) {
            require(
                t_min < t0,
                "sa.min_temperature",
                format!("floor {t_min} must be below the start temperature {t0}"),
            );
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => require(
                alpha > 0.0 && alpha < 1.0,
                "sa.cooling",
                format!("geometric alpha must be in (0, 1), got {alpha}"),
            ),
            CoolingSchedule::LundyMees { beta } => require(
                positive(beta),
                "sa.cooling",
                format!("lundy-mees beta must be positive, got {beta}"),
            ),
            CoolingSchedule::Linear => {}
        }
        require(
            self.iterations_per_temperature > 0,
            "sa.iterations_per_temperature",
            "must be at least 1".to_string(),
        );
        require(
            self.perturbation_size > 0,
            "sa.perturbation_size",
            "a neighbor must change at least one cell".to_string(),
        );
        require(
            self.time_limit_ms != Some(0),
            "sa.time_limit_ms",
            "use None for no limit".to_string(),
        );
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(config: &SaConfig) -> Vec<String> {
        config.validate().into_iter().map(|v| v.field).collect()
    }

    #[test]
    fn test_default_is_valid() {
        let config = SaConfig::default();
        assert_eq!(config.cooling, CoolingSchedule::Geometric { alpha: 0.95 });
        assert_eq!(config.max_iterations, 0);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_floor_must_be_below_start() {
        let config = SaConfig::default()
            .with_initial_temperature(0.5)
            .with_min_temperature(0.5);
        assert_eq!(fields(&config), ["sa.min_temperature"]);
    }

    #[test]
    fn test_cooling_parameters() {
        assert_eq!(
            fields(&SaConfig::default().with_cooling_rate(1.0)),
            ["sa.cooling"]
        );
        assert_eq!(
            fields(&SaConfig::default().with_cooling(CoolingSchedule::LundyMees { beta: -1.0 })),
            ["sa.cooling"]
        );
        assert!(SaConfig::default()
            .with_cooling(CoolingSchedule::Linear)
            .validate()
            .is_empty());
    }

    #[test]
    fn test_validate_collects_every_field() {
        let config = SaConfig::default()
            .with_initial_temperature(0.0)
            .with_min_temperature(f64::NAN)
            .with_iterations_per_temperature(0)
            .with_perturbation_size(0)
            .with_time_limit_ms(0);
        assert_eq!(
            fields(&config),
            [
                "sa.initial_temperature",
                "sa.min_temperature",
                "sa.iterations_per_temperature",
                "sa.perturbation_size",
                "sa.time_limit_ms",
            ]
        );
    }

    #[test]
    fn test_for_roster_scales_budget_and_moves() {
        let small = SaConfig::for_roster(5, 7);
        assert_eq!(small.max_iterations, 1_400);
        assert_eq!(small.perturbation_size, 2);

        let large = SaConfig::for_roster(60, 28);
        assert_eq!(large.max_iterations, 67_200);
        assert_eq!(large.perturbation_size, 4);

        assert!(SaConfig::for_roster(0, 0).validate().is_empty());
    }
}
